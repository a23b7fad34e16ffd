//! Analytics aggregator
//!
//! Consumes one event per committed turn and keeps per-session counter
//! buckets. Global snapshots are computed by summing buckets at
//! observation time, so the totals always equal the sum of ingested turns:
//! a turn is counted in exactly one bucket, exactly once. Counters only
//! increase until an explicit reset.

use parking_lot::RwLock;
use polyglot_core::{IntentLabel, Language, TurnRecord};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Bucket {
    turns: u64,
    fallbacks: u64,
    intents: HashMap<IntentLabel, u64>,
    languages: HashMap<Language, u64>,
}

/// Point-in-time, immutable aggregate view
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsSnapshot {
    pub total_turns: u64,
    pub total_sessions: u64,
    /// Turns where any sub-operation fell back to a non-primary backend
    pub fallback_turns: u64,
    pub intent_counts: HashMap<IntentLabel, u64>,
    pub language_counts: HashMap<Language, u64>,
    pub session_turn_counts: HashMap<String, u64>,
}

/// Running counters over all sessions' committed turns
///
/// Safe for concurrent ingestion: each turn is written once under the
/// write lock, snapshots read a consistent view under the read lock.
#[derive(Default)]
pub struct AnalyticsAggregator {
    sessions: RwLock<HashMap<String, Bucket>>,
}

impl AnalyticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one committed turn
    pub fn ingest(&self, record: &TurnRecord) {
        let mut sessions = self.sessions.write();
        let bucket = sessions.entry(record.session_id.clone()).or_default();
        bucket.turns += 1;
        if record.fallback_occurred {
            bucket.fallbacks += 1;
        }
        *bucket.intents.entry(record.intent).or_default() += 1;
        *bucket.languages.entry(record.input_lang).or_default() += 1;
    }

    /// Aggregate view, optionally restricted to one session
    pub fn snapshot(&self, session_id: Option<&str>) -> AnalyticsSnapshot {
        let sessions = self.sessions.read();
        let mut snapshot = AnalyticsSnapshot {
            total_turns: 0,
            total_sessions: 0,
            fallback_turns: 0,
            intent_counts: HashMap::new(),
            language_counts: HashMap::new(),
            session_turn_counts: HashMap::new(),
        };
        for (id, bucket) in sessions.iter() {
            if session_id.map_or(false, |filter| filter != id) {
                continue;
            }
            snapshot.total_sessions += 1;
            snapshot.total_turns += bucket.turns;
            snapshot.fallback_turns += bucket.fallbacks;
            for (intent, count) in &bucket.intents {
                *snapshot.intent_counts.entry(*intent).or_default() += count;
            }
            for (language, count) in &bucket.languages {
                *snapshot.language_counts.entry(*language).or_default() += count;
            }
            snapshot.session_turn_counts.insert(id.clone(), bucket.turns);
        }
        snapshot
    }

    /// Drop all counters
    pub fn reset(&self) {
        self.sessions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(session: &str, sequence: u64, intent: IntentLabel) -> TurnRecord {
        TurnRecord {
            session_id: session.to_string(),
            sequence,
            timestamp: Utc::now(),
            input_lang: Language::English,
            intent,
            backend_used: None,
            fallback_occurred: false,
            response_lang: Language::English,
        }
    }

    #[test]
    fn test_counts_match_ingested_turns_exactly() {
        let aggregator = AnalyticsAggregator::new();
        // 10 turns: greeting x3, question x4, unknown x3
        let mut seq = 0;
        for _ in 0..3 {
            aggregator.ingest(&record("s-1", seq, IntentLabel::Greeting));
            seq += 1;
        }
        for _ in 0..4 {
            aggregator.ingest(&record("s-1", seq, IntentLabel::Question));
            seq += 1;
        }
        for i in 0..3 {
            aggregator.ingest(&record("s-2", i, IntentLabel::Unknown));
        }

        let snapshot = aggregator.snapshot(None);
        assert_eq!(snapshot.total_turns, 10);
        assert_eq!(snapshot.intent_counts[&IntentLabel::Greeting], 3);
        assert_eq!(snapshot.intent_counts[&IntentLabel::Question], 4);
        assert_eq!(snapshot.intent_counts[&IntentLabel::Unknown], 3);
        let sum: u64 = snapshot.intent_counts.values().sum();
        assert_eq!(sum, 10);
        assert_eq!(snapshot.total_sessions, 2);
        assert_eq!(snapshot.session_turn_counts["s-1"], 7);
        assert_eq!(snapshot.session_turn_counts["s-2"], 3);
    }

    #[test]
    fn test_session_filter() {
        let aggregator = AnalyticsAggregator::new();
        aggregator.ingest(&record("a", 0, IntentLabel::Greeting));
        aggregator.ingest(&record("b", 0, IntentLabel::Question));

        let only_a = aggregator.snapshot(Some("a"));
        assert_eq!(only_a.total_turns, 1);
        assert_eq!(only_a.total_sessions, 1);
        assert!(!only_a.intent_counts.contains_key(&IntentLabel::Question));
    }

    #[test]
    fn test_global_snapshot_is_sum_of_per_session() {
        let aggregator = AnalyticsAggregator::new();
        for i in 0..5 {
            aggregator.ingest(&record("a", i, IntentLabel::Greeting));
        }
        for i in 0..7 {
            aggregator.ingest(&record("b", i, IntentLabel::Question));
        }
        let global = aggregator.snapshot(None);
        let a = aggregator.snapshot(Some("a"));
        let b = aggregator.snapshot(Some("b"));
        assert_eq!(global.total_turns, a.total_turns + b.total_turns);
    }

    #[test]
    fn test_reset_clears_counters() {
        let aggregator = AnalyticsAggregator::new();
        aggregator.ingest(&record("a", 0, IntentLabel::Greeting));
        aggregator.reset();
        assert_eq!(aggregator.snapshot(None).total_turns, 0);
    }
}
