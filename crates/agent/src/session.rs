//! Session management
//!
//! Sessions are independent: each owns its context store and is processed
//! turn-by-turn. Two locks per session keep that true under concurrency:
//!
//! - `turn_lock` is held across a whole `submit_turn`, serializing turns
//!   within the session (sessions never share it)
//! - `state` is held only for short reads/writes, so `reset` can run while
//!   a turn is in flight; the reset bumps the epoch and the in-flight
//!   turn's result is discarded at commit time

use crate::context::ContextStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use polyglot_core::{Language, Mode};
use std::sync::Arc;

/// Defaults applied to newly created sessions
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub target_language: Language,
    /// `None` lets translation backends auto-detect
    pub source_language: Option<Language>,
    pub mode: Mode,
    /// Context window size (completed turns kept)
    pub window: usize,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            target_language: Language::English,
            source_language: None,
            mode: Mode::Auto,
            window: crate::context::DEFAULT_WINDOW,
        }
    }
}

/// Mutable state behind the short-lived lock
pub struct SessionState {
    pub store: ContextStore,
    /// Bumped on every reset; a turn started under an older epoch is
    /// discarded at commit
    pub epoch: u64,
}

/// Handle to one session
pub struct Session {
    pub(crate) turn_lock: tokio::sync::Mutex<()>,
    pub(crate) state: Mutex<SessionState>,
}

impl Session {
    fn new(id: &str, defaults: &SessionDefaults) -> Self {
        let mut store = ContextStore::with_window(
            id,
            defaults.target_language,
            defaults.mode,
            defaults.window,
        );
        store.set_source_language(defaults.source_language);
        Self {
            turn_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState { store, epoch: 0 }),
        }
    }

    /// Run a closure against the locked state
    pub fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        f(&mut self.state.lock())
    }
}

/// Process-wide session map
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    defaults: SessionDefaults,
}

impl SessionManager {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            sessions: DashMap::new(),
            defaults,
        }
    }

    /// Look up a session, creating it on first interaction
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Session::new(id, &self.defaults)))
            .clone()
    }

    /// Clear a session's history and cancel its in-flight turn, keeping
    /// identity, language, and mode. Returns false for unknown sessions.
    pub fn reset(&self, id: &str) -> bool {
        match self.sessions.get(id) {
            Some(session) => {
                session.with_state(|state| {
                    state.store.reset();
                    state.epoch += 1;
                });
                tracing::info!(session = id, "session reset");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_stable() {
        let manager = SessionManager::new(SessionDefaults::default());
        let a = manager.get_or_create("s-1");
        let b = manager.get_or_create("s-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.session_count(), 1);
    }

    #[test]
    fn test_reset_bumps_epoch_and_clears_history() {
        let manager = SessionManager::new(SessionDefaults::default());
        let session = manager.get_or_create("s-1");
        let before = session.with_state(|s| s.epoch);
        assert!(manager.reset("s-1"));
        let (epoch, len) = session.with_state(|s| (s.epoch, s.store.len()));
        assert_eq!(epoch, before + 1);
        assert_eq!(len, 0);
    }

    #[test]
    fn test_reset_unknown_session() {
        let manager = SessionManager::new(SessionDefaults::default());
        assert!(!manager.reset("missing"));
    }
}
