//! Capability model
//!
//! Which backends exist for each operation kind, whether they are usable
//! right now, and in what order the router should try them. The map is
//! built once by the registry probe and refreshed only via explicit
//! re-probe; everything else reads it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of routable operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Speech-to-text
    Stt,
    /// Text-to-speech
    Tts,
    /// Text translation
    Translate,
    /// Conversational response generation
    Generate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Stt,
        OperationKind::Tts,
        OperationKind::Translate,
        OperationKind::Generate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Stt => "stt",
            OperationKind::Tts => "tts",
            OperationKind::Translate => "translate",
            OperationKind::Generate => "generate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a backend runs, which is what mode filtering keys on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendTier {
    /// Remote service reached over the network
    Cloud,
    /// Local process or sidecar, usable without connectivity
    Local,
}

/// Position of a backend within its candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPriority {
    Primary,
    Fallback,
}

/// Probe outcome for a single backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    /// Human-readable explanation when unavailable (what to install or
    /// configure), `None` when available
    pub reason: Option<String>,
}

impl Availability {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// One candidate backend as seen by the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Stable backend identifier (e.g. "cloud-stt", "sidecar-vosk")
    pub id: String,
    pub tier: BackendTier,
    pub priority: BackendPriority,
    pub available: bool,
    /// Present iff unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Probe result: ordered candidate lists per operation kind
///
/// Invariant: every operation kind has at least one candidate. The registry
/// guarantees this by always appending a degraded explain-to-user stub, so
/// the router never sees an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CapabilityMap {
    entries: HashMap<OperationKind, Vec<BackendDescriptor>>,
}

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor to the end of an operation's candidate list
    pub fn push(&mut self, operation: OperationKind, descriptor: BackendDescriptor) {
        self.entries.entry(operation).or_default().push(descriptor);
    }

    /// Ordered candidates for an operation (empty slice only before probe)
    pub fn candidates(&self, operation: OperationKind) -> &[BackendDescriptor] {
        self.entries
            .get(&operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any non-stub backend is usable for an operation
    pub fn has_usable(&self, operation: OperationKind) -> bool {
        self.candidates(operation).iter().any(|d| d.available)
    }

    /// Unavailability reasons for an operation, used to build user guidance
    pub fn reasons(&self, operation: OperationKind) -> Vec<&str> {
        self.candidates(operation)
            .iter()
            .filter_map(|d| d.reason.as_deref())
            .collect()
    }

    pub fn operations(&self) -> impl Iterator<Item = OperationKind> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, available: bool) -> BackendDescriptor {
        BackendDescriptor {
            id: id.to_string(),
            tier: BackendTier::Cloud,
            priority: BackendPriority::Primary,
            available,
            reason: (!available).then(|| "missing credential".to_string()),
        }
    }

    #[test]
    fn test_candidates_preserve_order() {
        let mut map = CapabilityMap::new();
        map.push(OperationKind::Stt, descriptor("a", true));
        map.push(OperationKind::Stt, descriptor("b", false));

        let ids: Vec<_> = map
            .candidates(OperationKind::Stt)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_reasons_only_from_unavailable() {
        let mut map = CapabilityMap::new();
        map.push(OperationKind::Tts, descriptor("a", true));
        map.push(OperationKind::Tts, descriptor("b", false));

        assert_eq!(map.reasons(OperationKind::Tts), vec!["missing credential"]);
        assert!(map.has_usable(OperationKind::Tts));
    }
}
