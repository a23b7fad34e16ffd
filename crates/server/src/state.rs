//! Application state
//!
//! Builds the backend set from settings, runs the startup capability
//! probe, and wires the conversation engine. Startup never fails on an
//! unusable backend; it logs what is missing and carries on degraded.

use crate::settings::Settings;
use polyglot_agent::{AnalyticsAggregator, ConversationEngine, EngineConfig};
use polyglot_agent::session::SessionDefaults;
use polyglot_core::OperationKind;
use polyglot_persistence::{FileTranslationLog, FileTurnLog};
use polyglot_pipeline::backends::{
    BackendSet, CloudGenerator, CloudSynthesizer, CloudTranscriber, CloudTranslator,
    EndpointConfig, SidecarSynthesizer, SidecarTranscriber, SidecarTranslator,
};
use polyglot_pipeline::{CapabilityRegistry, RouterConfig, ServiceRouter};
use polyglot_text_processing::{IntentClassifier, LanguageDetector};
use std::sync::Arc;
use std::time::Duration;

/// Shared state across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Build the full stack: backends, probe, router, engine
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let set = build_backend_set(&settings)?;
        let router_config = RouterConfig {
            attempt_timeout: Duration::from_millis(settings.engine.attempt_timeout_ms),
        };
        let router = Arc::new(ServiceRouter::probe_and_build(Arc::new(set), router_config).await);
        log_capability_summary(&router);

        let history = Arc::new(FileTurnLog::new(&settings.storage.history_path));
        let translations = Arc::new(FileTranslationLog::new(&settings.storage.translations_path));

        let defaults = SessionDefaults {
            target_language: settings.session.target_language,
            source_language: settings.session.source_language,
            mode: settings.session.mode,
            window: settings.session.window,
        };
        let engine = ConversationEngine::new(
            router,
            IntentClassifier::new(),
            LanguageDetector::default(),
            defaults,
            Arc::new(AnalyticsAggregator::new()),
            history,
            translations,
            EngineConfig {
                prompt_window: settings.engine.prompt_window,
            },
        );

        Ok(Self {
            engine: Arc::new(engine),
            settings: Arc::new(settings),
        })
    }
}

/// Register backends in attempt order: cloud tier first, then sidecars.
/// The builder appends the explain-to-user stubs itself.
fn build_backend_set(settings: &Settings) -> anyhow::Result<BackendSet> {
    let mut builder = BackendSet::builder();

    if let Some(cloud) = &settings.backends.cloud {
        let mut endpoint = EndpointConfig::new(&cloud.base_url);
        endpoint.api_key = cloud.api_key.clone();
        endpoint.timeout_ms = cloud.timeout_ms;

        builder = builder
            .stt(Arc::new(CloudTranscriber::new(endpoint.clone())?))
            .tts(Arc::new(CloudSynthesizer::new(endpoint.clone())?))
            .translate(Arc::new(CloudTranslator::new(endpoint.clone())?));
        for model in &cloud.generator_models {
            builder = builder.generate(Arc::new(CloudGenerator::new(endpoint.clone(), model)?));
        }
    }

    if let Some(stt) = &settings.backends.sidecar.stt {
        builder = builder.stt(Arc::new(SidecarTranscriber::new(
            EndpointConfig::new(&stt.base_url),
            stt.model_dir.clone(),
        )?));
    }
    if let Some(tts) = &settings.backends.sidecar.tts {
        builder = builder.tts(Arc::new(SidecarSynthesizer::new(EndpointConfig::new(
            &tts.base_url,
        ))?));
    }
    if let Some(translate) = &settings.backends.sidecar.translate {
        builder = builder.translate(Arc::new(SidecarTranslator::new(EndpointConfig::new(
            &translate.base_url,
        ))?));
    }

    Ok(builder.build())
}

fn log_capability_summary(router: &ServiceRouter) {
    let map = router.capabilities();
    for operation in OperationKind::ALL {
        if map.has_usable(operation) {
            tracing::info!(%operation, "operation usable");
        } else {
            tracing::warn!(
                %operation,
                reasons = map.reasons(operation).join("; "),
                "operation has no usable backend; turns needing it will degrade"
            );
        }
    }
    // degraded startup is allowed; the check only makes it loud
    if let Err(e) = CapabilityRegistry::startup_check(&map) {
        tracing::warn!(error = %e, "starting in degraded mode");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        let dir = std::env::temp_dir();
        let mut settings = Settings::default();
        settings.storage.history_path = dir.join("polyglot-test-history.jsonl");
        settings.storage.translations_path = dir.join("polyglot-test-translations.txt");
        settings
    }

    #[tokio::test]
    async fn test_build_with_no_backends_still_starts() {
        // nothing configured: every operation is stub-only but the state
        // builds and the engine answers (degraded)
        let state = AppState::build(test_settings()).await.unwrap();
        let map = state.engine.router().capabilities();
        for operation in OperationKind::ALL {
            assert!(!map.has_usable(operation));
            assert!(!map.reasons(operation).is_empty());
        }
    }
}
