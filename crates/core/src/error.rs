//! Error taxonomy shared across the workspace
//!
//! Three failure classes drive all control flow:
//! - `Unavailable` - no usable backend under the current mode; user-facing
//!   and recoverable (switch mode, install a component)
//! - `Transient` - one backend attempt failed; consumed by the router's
//!   fallback loop and only surfaced when every candidate is exhausted
//! - `Configuration` - missing external configuration, reported once at
//!   probe time rather than per turn

use crate::capability::OperationKind;
use serde::{Deserialize, Serialize};

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a transient backend failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientKind {
    /// Attempt exceeded its deadline
    Timeout,
    /// Backend rejected the request due to rate limiting
    RateLimited,
    /// Connection-level failure (DNS, refused, reset)
    Network(String),
    /// Backend reached but returned a retryable error
    Provider(String),
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransientKind::Timeout => write!(f, "timeout"),
            TransientKind::RateLimited => write!(f, "rate limited"),
            TransientKind::Network(msg) => write!(f, "network error: {}", msg),
            TransientKind::Provider(msg) => write!(f, "provider error: {}", msg),
        }
    }
}

/// Workspace-wide error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The requested capability has no usable backend right now
    #[error("{operation} unavailable: {reason}")]
    Unavailable {
        operation: OperationKind,
        reason: String,
    },

    /// A single backend attempt failed in a retryable way
    #[error("transient failure from backend '{backend}': {kind}")]
    Transient {
        backend: String,
        kind: TransientKind,
    },

    /// Required external configuration is missing
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input could not be parsed (language codes, persisted records)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Convenience constructor for an unavailable capability
    pub fn unavailable(operation: OperationKind, reason: impl Into<String>) -> Self {
        Error::Unavailable {
            operation,
            reason: reason.into(),
        }
    }

    /// Convenience constructor for a transient backend failure
    pub fn transient(backend: impl Into<String>, kind: TransientKind) -> Self {
        Error::Transient {
            backend: backend.into(),
            kind,
        }
    }

    /// Whether the router may retry another candidate after this failure
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }
}
