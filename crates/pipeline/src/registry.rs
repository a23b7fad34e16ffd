//! Capability registry
//!
//! Probes every registered backend and builds the process-wide
//! [`CapabilityMap`]. Probing never fails: a broken or missing backend is
//! recorded as unavailable with a human-readable reason. Re-probing with an
//! unchanged environment yields an identical map, and re-probing after an
//! environment change (model downloaded, sidecar started) picks it up.

use crate::backends::BackendSet;
use polyglot_core::{
    Backend, BackendDescriptor, BackendPriority, CapabilityMap, Error, OperationKind,
};
use std::sync::Arc;

/// Probes backends and reports what is usable
pub struct CapabilityRegistry {
    backends: Arc<BackendSet>,
}

impl CapabilityRegistry {
    pub fn new(backends: Arc<BackendSet>) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &Arc<BackendSet> {
        &self.backends
    }

    /// Probe every backend and build the capability map
    ///
    /// Candidate order in the map is registration order, which is attempt
    /// order for the router.
    pub async fn probe(&self) -> CapabilityMap {
        let mut map = CapabilityMap::new();
        probe_list(&mut map, OperationKind::Stt, self.backends.stt()).await;
        probe_list(&mut map, OperationKind::Tts, self.backends.tts()).await;
        probe_list(&mut map, OperationKind::Translate, self.backends.translate()).await;
        probe_list(&mut map, OperationKind::Generate, self.backends.generate()).await;
        map
    }

    /// One-time startup check: errors when an operation has no usable
    /// backend at all (only its stub remains)
    ///
    /// This surfaces missing configuration once, at probe time, instead of
    /// on every turn. The process keeps serving degraded turns either way.
    pub fn startup_check(map: &CapabilityMap) -> Result<(), Error> {
        let mut missing = Vec::new();
        for operation in OperationKind::ALL {
            if !map.has_usable(operation) {
                missing.push(operation.as_str());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "no usable backend for: {}; configure a cloud credential or install local components",
                missing.join(", ")
            )))
        }
    }
}

async fn probe_list<B: Backend + ?Sized>(
    map: &mut CapabilityMap,
    operation: OperationKind,
    backends: &[Arc<B>],
) {
    for (index, backend) in backends.iter().enumerate() {
        let availability = backend.probe().await;
        if let Some(reason) = &availability.reason {
            tracing::warn!(%operation, backend = backend.id(), reason, "backend unavailable");
        } else {
            tracing::info!(%operation, backend = backend.id(), "backend available");
        }
        map.push(
            operation,
            BackendDescriptor {
                id: backend.id().to_string(),
                tier: backend.tier(),
                priority: if index == 0 {
                    BackendPriority::Primary
                } else {
                    BackendPriority::Fallback
                },
                available: availability.available,
                reason: availability.reason,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bare set (stubs only) still yields one candidate per operation
    #[tokio::test]
    async fn test_probe_never_leaves_zero_candidates() {
        let registry = CapabilityRegistry::new(Arc::new(BackendSet::builder().build()));
        let map = registry.probe().await;
        for operation in OperationKind::ALL {
            let candidates = map.candidates(operation);
            assert_eq!(candidates.len(), 1, "{} should have its stub", operation);
            assert!(!candidates[0].available);
            assert!(candidates[0].reason.is_some());
        }
    }

    #[tokio::test]
    async fn test_probe_is_idempotent() {
        let registry = CapabilityRegistry::new(Arc::new(BackendSet::builder().build()));
        let first = registry.probe().await;
        let second = registry.probe().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_startup_check_reports_stub_only_operations() {
        let registry = CapabilityRegistry::new(Arc::new(BackendSet::builder().build()));
        let map = registry.probe().await;
        let err = CapabilityRegistry::startup_check(&map).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("stt"));
    }
}
