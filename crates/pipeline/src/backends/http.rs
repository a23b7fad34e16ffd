//! HTTP backends: cloud endpoints and localhost sidecars
//!
//! Cloud backends call a remote JSON API with a bearer credential; sidecar
//! backends call a localhost service that wraps a locally installed model
//! (recognizer, synthesizer, translation packs). Both tiers share one
//! endpoint helper for health probing and failure classification, so the
//! router sees a uniform `Transient`/`Unavailable` vocabulary from every
//! backend.

use async_trait::async_trait;
use polyglot_core::{
    AudioClip, Availability, Backend, BackendTier, Error, Language, PromptTurn, ResponseGenerator,
    Result, Synthesizer, Transcriber, Transcript, Translation, Translator, TransientKind,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings shared by every HTTP backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Bearer credential; required for cloud backends, unused by sidecars
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Shared request plumbing: client construction, health probe, JSON POST
/// with uniform failure classification
struct Endpoint {
    config: EndpointConfig,
    client: reqwest::Client,
}

impl Endpoint {
    fn new(config: EndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// GET /health; reachable-and-2xx means usable
    async fn health(&self) -> Availability {
        let url = format!("{}/health", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Availability::available(),
            Ok(resp) => Availability::unavailable(format!(
                "service at {} returned status {}",
                self.config.base_url,
                resp.status()
            )),
            Err(e) => Availability::unavailable(format!(
                "service at {} not reachable: {}",
                self.config.base_url, e
            )),
        }
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        backend_id: &str,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transient(backend_id, classify(&e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::transient(backend_id, TransientKind::RateLimited));
        }
        if !status.is_success() {
            return Err(Error::transient(
                backend_id,
                TransientKind::Provider(format!("status {}", status)),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| Error::transient(backend_id, TransientKind::Provider(e.to_string())))
    }
}

/// Map a reqwest failure into the transient taxonomy
fn classify(e: &reqwest::Error) -> TransientKind {
    if e.is_timeout() {
        TransientKind::Timeout
    } else if e.is_connect() || e.is_request() {
        TransientKind::Network(e.to_string())
    } else {
        TransientKind::Provider(e.to_string())
    }
}

/// Cloud probe: credential first, then reachability
async fn cloud_probe(endpoint: &Endpoint, what: &str) -> Availability {
    if endpoint.config.api_key.as_deref().unwrap_or("").is_empty() {
        return Availability::unavailable(format!(
            "no API key configured for the cloud {}; set it in the backend settings",
            what
        ));
    }
    endpoint.health().await
}

// ---------------------------------------------------------------------------
// Cloud tier
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    audio: &'a AudioClip,
    language: Language,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    text: String,
    confidence: f32,
    language: Language,
}

/// Cloud speech recognition endpoint
pub struct CloudTranscriber {
    endpoint: Endpoint,
}

impl CloudTranscriber {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for CloudTranscriber {
    fn id(&self) -> &str {
        "cloud-stt"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Cloud
    }

    async fn probe(&self) -> Availability {
        cloud_probe(&self.endpoint, "speech recognizer").await
    }
}

#[async_trait]
impl Transcriber for CloudTranscriber {
    async fn transcribe(&self, audio: &AudioClip, language: Language) -> Result<Transcript> {
        let resp: RecognizeResponse = self
            .endpoint
            .post_json(self.id(), "/v1/recognize", &RecognizeRequest { audio, language })
            .await?;
        Ok(Transcript {
            text: resp.text,
            confidence: resp.confidence,
            language: resp.language,
        })
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    language: Language,
}

/// Cloud speech synthesis endpoint
pub struct CloudSynthesizer {
    endpoint: Endpoint,
}

impl CloudSynthesizer {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for CloudSynthesizer {
    fn id(&self) -> &str {
        "cloud-tts"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Cloud
    }

    async fn probe(&self) -> Availability {
        cloud_probe(&self.endpoint, "speech synthesizer").await
    }
}

#[async_trait]
impl Synthesizer for CloudSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip> {
        let clip: AudioClip = self
            .endpoint
            .post_json(self.id(), "/v1/synthesize", &SynthesizeRequest { text, language })
            .await?;
        Ok(clip.with_language(language))
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<Language>,
    target: Language,
}

#[derive(Deserialize)]
struct TranslateResponse {
    text: String,
    source: Language,
    target: Language,
}

/// Cloud translation endpoint
pub struct CloudTranslator {
    endpoint: Endpoint,
}

impl CloudTranslator {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for CloudTranslator {
    fn id(&self) -> &str {
        "cloud-translate"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Cloud
    }

    async fn probe(&self) -> Availability {
        cloud_probe(&self.endpoint, "translator").await
    }
}

#[async_trait]
impl Translator for CloudTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<Translation> {
        let resp: TranslateResponse = self
            .endpoint
            .post_json(self.id(), "/v1/translate", &TranslateRequest { text, source, target })
            .await?;
        Ok(Translation {
            text: resp.text,
            source: resp.source,
            target: resp.target,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    utterance: &'a str,
    context: &'a [PromptTurn],
    language: Language,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Cloud conversational model endpoint
///
/// One instance per model; register the fast model first and the larger
/// model as fallback so the router walks the chain in order.
pub struct CloudGenerator {
    id: String,
    model: String,
    endpoint: Endpoint,
}

impl CloudGenerator {
    pub fn new(config: EndpointConfig, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        Ok(Self {
            id: format!("cloud-gen-{}", model),
            model,
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for CloudGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Cloud
    }

    async fn probe(&self) -> Availability {
        cloud_probe(&self.endpoint, "conversational model").await
    }
}

#[async_trait]
impl ResponseGenerator for CloudGenerator {
    async fn generate(
        &self,
        utterance: &str,
        context: &[PromptTurn],
        language: Language,
    ) -> Result<String> {
        let resp: GenerateResponse = self
            .endpoint
            .post_json(
                &self.id,
                "/v1/generate",
                &GenerateRequest {
                    model: &self.model,
                    utterance,
                    context,
                    language,
                },
            )
            .await?;
        Ok(resp.text)
    }
}

// ---------------------------------------------------------------------------
// Local tier (sidecars)
// ---------------------------------------------------------------------------

/// Localhost recognizer sidecar wrapping a locally installed model
///
/// The probe requires both the model directory on disk and a healthy
/// sidecar process, so a freshly downloaded model shows up on re-probe
/// without a restart.
pub struct SidecarTranscriber {
    endpoint: Endpoint,
    model_dir: Option<PathBuf>,
}

impl SidecarTranscriber {
    pub fn new(config: EndpointConfig, model_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
            model_dir,
        })
    }
}

#[async_trait]
impl Backend for SidecarTranscriber {
    fn id(&self) -> &str {
        "sidecar-stt"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Local
    }

    async fn probe(&self) -> Availability {
        match &self.model_dir {
            Some(dir) if dir.is_dir() => self.endpoint.health().await,
            Some(dir) => Availability::unavailable(format!(
                "recognizer model not found at {}; download a model and point the settings at it",
                dir.display()
            )),
            None => Availability::unavailable(
                "no local recognizer model configured; set the model directory in the settings",
            ),
        }
    }
}

#[async_trait]
impl Transcriber for SidecarTranscriber {
    async fn transcribe(&self, audio: &AudioClip, language: Language) -> Result<Transcript> {
        let resp: RecognizeResponse = self
            .endpoint
            .post_json(self.id(), "/transcribe", &RecognizeRequest { audio, language })
            .await?;
        Ok(Transcript {
            text: resp.text,
            confidence: resp.confidence,
            language: resp.language,
        })
    }
}

/// Localhost synthesizer sidecar
pub struct SidecarSynthesizer {
    endpoint: Endpoint,
}

impl SidecarSynthesizer {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for SidecarSynthesizer {
    fn id(&self) -> &str {
        "sidecar-tts"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Local
    }

    async fn probe(&self) -> Availability {
        self.endpoint.health().await
    }
}

#[async_trait]
impl Synthesizer for SidecarSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip> {
        let clip: AudioClip = self
            .endpoint
            .post_json(self.id(), "/synthesize", &SynthesizeRequest { text, language })
            .await?;
        Ok(clip.with_language(language))
    }
}

#[derive(Deserialize)]
struct InstalledLanguages {
    languages: Vec<Language>,
}

/// Localhost translation sidecar backed by installed language packs
pub struct SidecarTranslator {
    endpoint: Endpoint,
}

impl SidecarTranslator {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for SidecarTranslator {
    fn id(&self) -> &str {
        "sidecar-translate"
    }

    fn tier(&self) -> BackendTier {
        BackendTier::Local
    }

    /// Usable only when the sidecar reports at least one installed pack
    async fn probe(&self) -> Availability {
        let url = format!("{}/languages", self.endpoint.config.base_url);
        match self.endpoint.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<InstalledLanguages>().await {
                    Ok(installed) if !installed.languages.is_empty() => Availability::available(),
                    Ok(_) => Availability::unavailable(
                        "local translator has no language packs installed; install .pack files for your language pair",
                    ),
                    Err(e) => Availability::unavailable(format!(
                        "local translator returned an unreadable language list: {}",
                        e
                    )),
                }
            }
            Ok(resp) => Availability::unavailable(format!(
                "local translator returned status {}",
                resp.status()
            )),
            Err(e) => Availability::unavailable(format!("local translator not reachable: {}", e)),
        }
    }
}

#[async_trait]
impl Translator for SidecarTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<Translation> {
        let resp: TranslateResponse = self
            .endpoint
            .post_json(self.id(), "/translate", &TranslateRequest { text, source, target })
            .await?;
        Ok(Translation {
            text: resp.text,
            source: resp.source,
            target: resp.target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cloud_probe_requires_api_key() {
        let backend =
            CloudTranscriber::new(EndpointConfig::new("http://127.0.0.1:9")).unwrap();
        let availability = backend.probe().await;
        assert!(!availability.available);
        assert!(availability.reason.unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_sidecar_probe_requires_model_dir() {
        let backend = SidecarTranscriber::new(
            EndpointConfig::new("http://127.0.0.1:9"),
            Some(PathBuf::from("/nonexistent/model")),
        )
        .unwrap();
        let availability = backend.probe().await;
        assert!(!availability.available);
        assert!(availability.reason.unwrap().contains("model not found"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient_network() {
        // port 9 (discard) is closed; connection must fail fast
        let mut config = EndpointConfig::new("http://127.0.0.1:9");
        config.timeout_ms = 500;
        config.api_key = Some("key".into());
        let backend = CloudTranslator::new(config).unwrap();
        let err = backend
            .translate("hello", None, Language::Hindi)
            .await
            .unwrap_err();
        match err {
            Error::Transient { backend, kind } => {
                assert_eq!(backend, "cloud-translate");
                assert!(matches!(
                    kind,
                    TransientKind::Network(_) | TransientKind::Timeout
                ));
            }
            other => panic!("expected transient, got {:?}", other),
        }
    }
}
