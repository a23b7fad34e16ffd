//! Router result types
//!
//! The router never panics and never loses a failure reason: every
//! attempted candidate's failure travels with the eventual error so the
//! caller can explain exactly what was tried.

use polyglot_core::{Mode, OperationKind, TransientKind};
use serde::{Deserialize, Serialize};

/// One failed candidate attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendAttempt {
    pub backend: String,
    pub failure: TransientKind,
}

/// Typed router failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouteError {
    /// No candidate is even eligible under the current mode. Recoverable:
    /// the reason tells the user what to install or which mode to switch to.
    #[error("{operation} unavailable in {mode} mode: {reason}")]
    Unavailable {
        operation: OperationKind,
        mode: Mode,
        reason: String,
    },

    /// Every eligible candidate was attempted and failed
    #[error("{operation} failed after {} attempt(s)", attempts.len())]
    Exhausted {
        operation: OperationKind,
        attempts: Vec<BackendAttempt>,
    },
}

impl RouteError {
    /// Human-readable explanation suitable for a degraded response
    pub fn user_message(&self) -> String {
        match self {
            RouteError::Unavailable { operation, mode, reason } => format!(
                "{} is not available in {} mode: {}",
                operation, mode, reason
            ),
            RouteError::Exhausted { operation, attempts } => {
                let detail: Vec<String> = attempts
                    .iter()
                    .map(|a| format!("{} ({})", a.backend, a.failure))
                    .collect();
                format!(
                    "{} failed on every backend: {}",
                    operation,
                    detail.join(", ")
                )
            }
        }
    }
}

/// Successful router result, tagged with which backend satisfied it
#[derive(Debug, Clone, PartialEq)]
pub struct Routed<T> {
    pub value: T,
    /// Id of the satisfying backend
    pub backend: String,
    /// True when at least one earlier candidate was attempted and failed
    pub fallback_occurred: bool,
}

impl<T> Routed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Routed<U> {
        Routed {
            value: f(self.value),
            backend: self.backend,
            fallback_occurred: self.fallback_occurred,
        }
    }
}
