//! Append-only persistence for turn history and translations
//!
//! The engine only sees the sink traits; storage is pluggable:
//! - file-backed logs (JSON lines for turns, plain text for translations)
//! - in-memory logs for tests and ephemeral deployments
//!
//! Append-only is part of the contract: records are never rewritten or
//! reordered, and loading returns them in append order.

pub mod history;
pub mod translations;

pub use history::{FileTurnLog, MemoryTurnLog, TurnSink};
pub use translations::{
    FileTranslationLog, MemoryTranslationLog, TranslationEntry, TranslationSink,
};

/// Persistence failure
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
