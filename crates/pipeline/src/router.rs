//! Service router
//!
//! Executes one operation against an ordered candidate list with strict
//! sequential fallback. Candidates come from the capability map (probe
//! snapshot), filtered by the user-selected mode:
//!
//! - `offline` - local tier only
//! - `online`  - cloud tier only
//! - `auto`    - everything, cloud-first
//!
//! A transient failure (timeout, rate limit, network) moves to the next
//! candidate immediately; success stops the walk, so no candidate past the
//! first success is ever attempted. Exhaustion returns every attempt's
//! failure reason for diagnostics.

use crate::backends::BackendSet;
use crate::error::{BackendAttempt, RouteError, Routed};
use crate::registry::CapabilityRegistry;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use polyglot_core::{
    AudioClip, Backend, BackendDescriptor, BackendTier, CapabilityMap, Error, Language, Mode,
    OperationKind, PromptTurn, Transcript, TransientKind, Translation,
};
use std::sync::Arc;
use std::time::Duration;

/// Router tuning knobs
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Deadline for each individual backend attempt; an elapsed deadline is
    /// a transient failure and fallback proceeds
    pub attempt_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

/// Routes operations to backends with fallback
pub struct ServiceRouter {
    backends: Arc<BackendSet>,
    registry: CapabilityRegistry,
    capabilities: RwLock<CapabilityMap>,
    config: RouterConfig,
}

impl ServiceRouter {
    /// Build a router from a backend set, probing once for the initial map
    pub async fn probe_and_build(backends: Arc<BackendSet>, config: RouterConfig) -> Self {
        let registry = CapabilityRegistry::new(backends.clone());
        let capabilities = registry.probe().await;
        Self {
            backends,
            registry,
            capabilities: RwLock::new(capabilities),
            config,
        }
    }

    /// Point-in-time copy of the capability map
    pub fn capabilities(&self) -> CapabilityMap {
        self.capabilities.read().clone()
    }

    /// Re-probe the environment and swap in the fresh map
    pub async fn refresh_capabilities(&self) -> CapabilityMap {
        let fresh = self.registry.probe().await;
        *self.capabilities.write() = fresh.clone();
        fresh
    }

    pub async fn transcribe(
        &self,
        audio: &AudioClip,
        language: Language,
        mode: Mode,
    ) -> Result<Routed<Transcript>, RouteError> {
        self.run(OperationKind::Stt, mode, self.backends.stt(), |b| {
            Box::pin(b.transcribe(audio, language))
        })
        .await
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
        mode: Mode,
    ) -> Result<Routed<AudioClip>, RouteError> {
        self.run(OperationKind::Tts, mode, self.backends.tts(), |b| {
            Box::pin(b.synthesize(text, language))
        })
        .await
    }

    pub async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
        mode: Mode,
    ) -> Result<Routed<Translation>, RouteError> {
        self.run(OperationKind::Translate, mode, self.backends.translate(), |b| {
            Box::pin(b.translate(text, source, target))
        })
        .await
    }

    pub async fn generate(
        &self,
        utterance: &str,
        context: &[PromptTurn],
        language: Language,
        mode: Mode,
    ) -> Result<Routed<String>, RouteError> {
        self.run(OperationKind::Generate, mode, self.backends.generate(), |b| {
            Box::pin(b.generate(utterance, context, language))
        })
        .await
    }

    /// The single fallback loop every operation goes through
    async fn run<'a, B, T>(
        &self,
        operation: OperationKind,
        mode: Mode,
        backends: &'a [Arc<B>],
        call: impl Fn(&'a B) -> BoxFuture<'a, polyglot_core::Result<T>>,
    ) -> Result<Routed<T>, RouteError>
    where
        B: Backend + ?Sized,
    {
        let descriptors: Vec<BackendDescriptor> =
            self.capabilities.read().candidates(operation).to_vec();

        // Pair registered backends with their probe descriptors, keeping
        // only the tiers the mode permits. Registration order is attempt
        // order.
        let eligible: Vec<(&Arc<B>, &BackendDescriptor)> = backends
            .iter()
            .zip(descriptors.iter())
            .filter(|(backend, descriptor)| {
                debug_assert_eq!(backend.id(), descriptor.id);
                mode_permits(mode, descriptor.tier)
            })
            .collect();

        if !eligible.iter().any(|(_, d)| d.available) {
            let reasons: Vec<&str> = eligible
                .iter()
                .filter_map(|(_, d)| d.reason.as_deref())
                .collect();
            let reason = if reasons.is_empty() {
                format!("no {} backend is registered for this mode", operation)
            } else {
                reasons.join("; ")
            };
            tracing::warn!(%operation, %mode, reason, "no eligible backend");
            return Err(RouteError::Unavailable {
                operation,
                mode,
                reason,
            });
        }

        let mut attempts: Vec<BackendAttempt> = Vec::new();
        for (position, (backend, descriptor)) in eligible.into_iter().enumerate() {
            if !descriptor.available {
                // Skipped, not attempted; a later success still counts as
                // a fallback because the preferred candidate was unusable.
                continue;
            }
            tracing::debug!(%operation, backend = descriptor.id.as_str(), position, "attempting backend");

            let outcome = tokio::time::timeout(self.config.attempt_timeout, call(backend.as_ref())).await;
            let failure = match outcome {
                Ok(Ok(value)) => {
                    let fallback_occurred = position > 0;
                    if fallback_occurred {
                        tracing::info!(
                            %operation,
                            backend = descriptor.id.as_str(),
                            failed = attempts.len(),
                            "operation satisfied by fallback backend"
                        );
                    }
                    return Ok(Routed {
                        value,
                        backend: descriptor.id.clone(),
                        fallback_occurred,
                    });
                }
                Err(_elapsed) => TransientKind::Timeout,
                Ok(Err(Error::Transient { kind, .. })) => kind,
                // Call-time unavailability (stale probe) is treated like a
                // transient skip; the probe snapshot decides candidacy.
                Ok(Err(Error::Unavailable { reason, .. })) => TransientKind::Provider(reason),
                Ok(Err(other)) => TransientKind::Provider(other.to_string()),
            };
            tracing::warn!(
                %operation,
                backend = descriptor.id.as_str(),
                failure = %failure,
                "backend attempt failed, trying next candidate"
            );
            attempts.push(BackendAttempt {
                backend: descriptor.id.clone(),
                failure,
            });
        }

        tracing::error!(%operation, attempts = attempts.len(), "all backends exhausted");
        Err(RouteError::Exhausted {
            operation,
            attempts,
        })
    }
}

fn mode_permits(mode: Mode, tier: BackendTier) -> bool {
    match mode {
        Mode::Auto => true,
        Mode::Online => tier == BackendTier::Cloud,
        Mode::Offline => tier == BackendTier::Local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendSet;
    use async_trait::async_trait;
    use polyglot_core::{Availability, Result as CoreResult, Translator};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted translator for router tests
    struct MockTranslator {
        id: String,
        tier: BackendTier,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    enum Behavior {
        Succeed,
        FailTransient(TransientKind),
        Hang,
    }

    impl MockTranslator {
        fn new(id: &str, tier: BackendTier, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                tier,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for MockTranslator {
        fn id(&self) -> &str {
            &self.id
        }

        fn tier(&self) -> BackendTier {
            self.tier
        }

        async fn probe(&self) -> Availability {
            Availability::available()
        }
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(
            &self,
            text: &str,
            source: Option<Language>,
            target: Language,
        ) -> CoreResult<Translation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed => Ok(Translation {
                    text: format!("{}:{}", self.id, text),
                    source: source.unwrap_or(Language::English),
                    target,
                }),
                Behavior::FailTransient(kind) => Err(Error::transient(&self.id, kind.clone())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    unreachable!("hung mock should be timed out")
                }
            }
        }
    }

    async fn router_with(translators: Vec<Arc<MockTranslator>>, config: RouterConfig) -> ServiceRouter {
        let mut builder = BackendSet::builder();
        for t in translators {
            builder = builder.translate(t);
        }
        ServiceRouter::probe_and_build(Arc::new(builder.build()), config).await
    }

    #[tokio::test]
    async fn test_auto_falls_back_and_stops_at_first_success() {
        let first = MockTranslator::new(
            "cloud-a",
            BackendTier::Cloud,
            Behavior::FailTransient(TransientKind::RateLimited),
        );
        let second = MockTranslator::new("cloud-b", BackendTier::Cloud, Behavior::Succeed);
        let third = MockTranslator::new("local-c", BackendTier::Local, Behavior::Succeed);
        let router = router_with(
            vec![first.clone(), second.clone(), third.clone()],
            RouterConfig::default(),
        )
        .await;

        let routed = router
            .translate("hello", None, Language::Hindi, Mode::Auto)
            .await
            .unwrap();

        assert_eq!(routed.backend, "cloud-b");
        assert!(routed.fallback_occurred);
        assert_eq!(routed.value.text, "cloud-b:hello");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
        // the candidate past the first success is never attempted
        assert_eq!(third.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_success_is_not_a_fallback() {
        let primary = MockTranslator::new("cloud-a", BackendTier::Cloud, Behavior::Succeed);
        let router = router_with(vec![primary], RouterConfig::default()).await;

        let routed = router
            .translate("hi", None, Language::French, Mode::Auto)
            .await
            .unwrap();
        assert_eq!(routed.backend, "cloud-a");
        assert!(!routed.fallback_occurred);
    }

    #[tokio::test]
    async fn test_offline_with_no_local_backend_is_unavailable() {
        // stubs only: no local STT is installed
        let router =
            ServiceRouter::probe_and_build(Arc::new(BackendSet::builder().build()), RouterConfig::default())
                .await;

        let clip = AudioClip::new(polyglot_core::AudioFormat::Pcm16, vec![0, 0]);
        let err = router
            .transcribe(&clip, Language::English, Mode::Offline)
            .await
            .unwrap_err();

        match err {
            RouteError::Unavailable { operation, mode, reason } => {
                assert_eq!(operation, OperationKind::Stt);
                assert_eq!(mode, Mode::Offline);
                assert!(!reason.is_empty());
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_online_mode_excludes_local_tier() {
        let local = MockTranslator::new("local-only", BackendTier::Local, Behavior::Succeed);
        let router = router_with(vec![local.clone()], RouterConfig::default()).await;

        let err = router
            .translate("hello", None, Language::Hindi, Mode::Online)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Unavailable { .. }));
        assert_eq!(local.call_count(), 0);

        // same set works offline
        let ok = router
            .translate("hello", None, Language::Hindi, Mode::Offline)
            .await
            .unwrap();
        assert_eq!(ok.backend, "local-only");
    }

    #[tokio::test]
    async fn test_exhaustion_keeps_every_attempt_reason() {
        let a = MockTranslator::new(
            "cloud-a",
            BackendTier::Cloud,
            Behavior::FailTransient(TransientKind::Timeout),
        );
        let b = MockTranslator::new(
            "cloud-b",
            BackendTier::Cloud,
            Behavior::FailTransient(TransientKind::Network("connection refused".into())),
        );
        let router = router_with(vec![a, b], RouterConfig::default()).await;

        let err = router
            .translate("hello", None, Language::Hindi, Mode::Online)
            .await
            .unwrap_err();
        match err {
            RouteError::Exhausted { attempts, .. } => {
                let ids: Vec<_> = attempts.iter().map(|a| a.backend.as_str()).collect();
                assert_eq!(ids, vec!["cloud-a", "cloud-b"]);
                assert_eq!(attempts[0].failure, TransientKind::Timeout);
                assert!(matches!(attempts[1].failure, TransientKind::Network(_)));
            }
            other => panic!("expected exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_transient() {
        let slow = MockTranslator::new("cloud-slow", BackendTier::Cloud, Behavior::Hang);
        let fast = MockTranslator::new("cloud-fast", BackendTier::Cloud, Behavior::Succeed);
        let config = RouterConfig {
            attempt_timeout: Duration::from_millis(50),
        };
        let router = router_with(vec![slow, fast], config).await;

        let routed = router
            .translate("hello", None, Language::Hindi, Mode::Auto)
            .await
            .unwrap();
        assert_eq!(routed.backend, "cloud-fast");
        assert!(routed.fallback_occurred);
    }
}
