//! Conversation types: modes, intents, turns

use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User-selected routing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Cloud-first with local fallback
    #[default]
    Auto,
    /// Cloud tier only
    Online,
    /// Local tier only
    Offline,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Online => "online",
            Mode::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Closed set of intent labels
///
/// `Unknown` is the safe default: classification is total and never fails.
/// The engine routes `Unknown` like `GeneralConversation` but records it
/// distinctly for analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    TranslationRequest,
    Greeting,
    Question,
    GeneralConversation,
    Unknown,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::TranslationRequest => "translation_request",
            IntentLabel::Greeting => "greeting",
            IntentLabel::Question => "question",
            IntentLabel::GeneralConversation => "general_conversation",
            IntentLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend satisfied each sub-operation of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackendUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
}

impl BackendUsage {
    /// The backend most representative of this turn, for the persisted
    /// record's single `backend_used` field
    pub fn primary(&self) -> Option<&str> {
        self.generation
            .as_deref()
            .or(self.translation.as_deref())
            .or(self.transcription.as_deref())
            .or(self.synthesis.as_deref())
    }
}

/// Per-turn processing phases
///
/// Every turn must reach `Responded`; failures along the way degrade the
/// response text rather than aborting. `Logged` follows commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Received,
    Classified,
    Routed,
    Responded,
    Logged,
}

/// One complete request/response exchange, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Monotonic within the session, starts at 0
    pub sequence: u64,
    pub input: String,
    pub input_language: Language,
    pub intent: IntentLabel,
    pub response: String,
    pub response_language: Language,
    pub requested_at: DateTime<Utc>,
    pub responded_at: DateTime<Utc>,
    pub backends: BackendUsage,
    /// True when any sub-operation was satisfied by a non-first candidate
    pub fallback_occurred: bool,
    /// True when a sub-operation failed and the response is a substitute
    /// explanation rather than the requested result
    pub degraded: bool,
}

impl Turn {
    /// Project this turn into its persisted history record
    pub fn to_record(&self, session_id: &str) -> TurnRecord {
        TurnRecord {
            session_id: session_id.to_string(),
            sequence: self.sequence,
            timestamp: self.responded_at,
            input_lang: self.input_language,
            intent: self.intent,
            backend_used: self.backends.primary().map(str::to_string),
            fallback_occurred: self.fallback_occurred,
            response_lang: self.response_language,
        }
    }
}

/// Persisted, append-only history record (one per completed turn)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub input_lang: Language,
    pub intent: IntentLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_used: Option<String>,
    pub fallback_occurred: bool,
    pub response_lang: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_usage_primary_preference() {
        let mut usage = BackendUsage::default();
        assert_eq!(usage.primary(), None);

        usage.synthesis = Some("cloud-tts".into());
        assert_eq!(usage.primary(), Some("cloud-tts"));

        usage.generation = Some("cloud-flash".into());
        assert_eq!(usage.primary(), Some("cloud-flash"));
    }

    #[test]
    fn test_turn_record_projection() {
        let now = Utc::now();
        let turn = Turn {
            sequence: 3,
            input: "hello".into(),
            input_language: Language::English,
            intent: IntentLabel::Greeting,
            response: "hi there".into(),
            response_language: Language::Hindi,
            requested_at: now,
            responded_at: now,
            backends: BackendUsage {
                generation: Some("cloud-flash".into()),
                ..Default::default()
            },
            fallback_occurred: true,
            degraded: false,
        };

        let record = turn.to_record("s-1");
        assert_eq!(record.session_id, "s-1");
        assert_eq!(record.sequence, 3);
        assert_eq!(record.intent, IntentLabel::Greeting);
        assert_eq!(record.backend_used.as_deref(), Some("cloud-flash"));
        assert!(record.fallback_occurred);
    }
}
