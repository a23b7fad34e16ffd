//! Per-session context store
//!
//! Bounded FIFO window of completed turns. The window gives the classifier
//! and the generator limited memory without unbounded growth; eviction is
//! oldest-first. Appends are strictly ordered: a turn whose sequence number
//! does not immediately follow the last committed one is rejected, which is
//! what serializes turns within a session at the data level.

use polyglot_core::{Language, Mode, PromptTurn, Turn};
use std::collections::VecDeque;

/// Default window size (completed turns kept per session)
pub const DEFAULT_WINDOW: usize = 10;

/// Rejected append
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("out-of-order append: expected sequence {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },
}

/// Bounded conversation history plus per-session selections
#[derive(Debug, Clone)]
pub struct ContextStore {
    session_id: String,
    target_language: Language,
    /// `None` means backends auto-detect the source
    source_language: Option<Language>,
    mode: Mode,
    window: usize,
    turns: VecDeque<Turn>,
    next_sequence: u64,
}

impl ContextStore {
    pub fn new(session_id: impl Into<String>, target_language: Language, mode: Mode) -> Self {
        Self::with_window(session_id, target_language, mode, DEFAULT_WINDOW)
    }

    pub fn with_window(
        session_id: impl Into<String>,
        target_language: Language,
        mode: Mode,
        window: usize,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            target_language,
            source_language: None,
            mode,
            window: window.max(1),
            turns: VecDeque::new(),
            next_sequence: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn target_language(&self) -> Language {
        self.target_language
    }

    pub fn set_target_language(&mut self, language: Language) {
        self.target_language = language;
    }

    pub fn source_language(&self) -> Option<Language> {
        self.source_language
    }

    pub fn set_source_language(&mut self, language: Option<Language>) {
        self.source_language = language;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Sequence number the next turn must carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed turn, evicting the oldest beyond the window
    pub fn append(&mut self, turn: Turn) -> Result<(), ContextError> {
        if turn.sequence != self.next_sequence {
            return Err(ContextError::OutOfOrder {
                expected: self.next_sequence,
                got: turn.sequence,
            });
        }
        self.next_sequence += 1;
        self.turns.push_back(turn);
        while self.turns.len() > self.window {
            self.turns.pop_front();
        }
        Ok(())
    }

    /// The most recent `n` turns, oldest first, never more than the window
    pub fn recent(&self, n: usize) -> Vec<Turn> {
        let take = n.min(self.turns.len());
        self.turns
            .iter()
            .skip(self.turns.len() - take)
            .cloned()
            .collect()
    }

    /// Recent turns shaped as generator prompt context
    pub fn prompt_context(&self, n: usize) -> Vec<PromptTurn> {
        self.recent(n)
            .into_iter()
            .map(|t| PromptTurn {
                user: t.input,
                assistant: t.response,
            })
            .collect()
    }

    /// Clear history, keep identity, language pair, and mode; sequence
    /// restarts at 0. Persisted records written before the reset keep
    /// their old sequence numbers, so a session's log can repeat a
    /// `(session_id, sequence)` pair across resets; replay readers must
    /// order by append position (or timestamp), not by sequence alone.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polyglot_core::{BackendUsage, IntentLabel};

    fn turn(sequence: u64) -> Turn {
        let now = Utc::now();
        Turn {
            sequence,
            input: format!("input {}", sequence),
            input_language: Language::English,
            intent: IntentLabel::GeneralConversation,
            response: format!("response {}", sequence),
            response_language: Language::English,
            requested_at: now,
            responded_at: now,
            backends: BackendUsage::default(),
            fallback_occurred: false,
            degraded: false,
        }
    }

    fn store_with(window: usize, turns: u64) -> ContextStore {
        let mut store =
            ContextStore::with_window("s-1", Language::Hindi, Mode::Auto, window);
        for seq in 0..turns {
            store.append(turn(seq)).unwrap();
        }
        store
    }

    #[test]
    fn test_recent_is_bounded_and_oldest_first() {
        // 5 turns into a window of 3: recent(10) is exactly the last 3
        let store = store_with(3, 5);
        let recent = store.recent(10);
        assert_eq!(recent.len(), 3);
        let sequences: Vec<u64> = recent.iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[test]
    fn test_recent_smaller_than_window() {
        let store = store_with(10, 4);
        assert_eq!(store.recent(2).len(), 2);
        assert_eq!(store.recent(2)[0].sequence, 2);
    }

    #[test]
    fn test_append_rejects_out_of_order() {
        let mut store = store_with(10, 2);
        let err = store.append(turn(5)).unwrap_err();
        assert_eq!(err, ContextError::OutOfOrder { expected: 2, got: 5 });
        // replay of an already-committed sequence is rejected too
        let err = store.append(turn(1)).unwrap_err();
        assert_eq!(err, ContextError::OutOfOrder { expected: 2, got: 1 });
        // the correct sequence still lands
        store.append(turn(2)).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_reset_preserves_identity_and_restarts_sequence() {
        let mut store = store_with(10, 3);
        store.set_source_language(Some(Language::English));
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.next_sequence(), 0);
        assert_eq!(store.session_id(), "s-1");
        assert_eq!(store.target_language(), Language::Hindi);
        assert_eq!(store.source_language(), Some(Language::English));
        assert_eq!(store.mode(), Mode::Auto);
        store.append(turn(0)).unwrap();
    }

    #[test]
    fn test_prompt_context_maps_exchanges() {
        let store = store_with(10, 2);
        let prompt = store.prompt_context(5);
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].user, "input 0");
        assert_eq!(prompt[1].assistant, "response 1");
    }
}
