//! Speech processing traits

use super::Backend;
use crate::audio::AudioClip;
use crate::error::Result;
use crate::language::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Recognized speech with a confidence estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// 0.0 - 1.0, backend-reported or estimated
    pub confidence: f32,
    /// Language the recognizer believes it heard
    pub language: Language,
}

/// Speech-to-text interface
///
/// Implementations:
/// - `HttpTranscriber` - cloud speech recognition endpoint
/// - `SidecarTranscriber` - localhost recognizer service with a local model
/// - `UnavailableTranscriber` - degraded stub that explains what to install
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn Transcriber> = Arc::new(SidecarTranscriber::new(config));
/// let transcript = stt.transcribe(&clip, Language::English).await?;
/// println!("heard: {}", transcript.text);
/// ```
#[async_trait]
pub trait Transcriber: Backend {
    /// Transcribe a complete audio clip
    ///
    /// Errors are `Transient` (retryable, fuels router fallback) or
    /// `Unavailable` (this backend cannot serve right now).
    async fn transcribe(&self, audio: &AudioClip, language: Language) -> Result<Transcript>;
}

/// Text-to-speech interface
///
/// Implementations mirror the transcriber set: cloud endpoint, localhost
/// sidecar, degraded stub.
#[async_trait]
pub trait Synthesizer: Backend {
    /// Synthesize text into an audio clip in the given language
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioClip>;
}
