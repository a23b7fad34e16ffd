//! Degraded explain-to-user stubs
//!
//! One stub per operation kind backs every candidate list so the router
//! never sees zero candidates. Stubs always probe unavailable with an
//! install hint and refuse calls with the same guidance.

use async_trait::async_trait;
use polyglot_core::{
    AudioClip, Availability, Backend, BackendTier, Error, Language, OperationKind, PromptTurn,
    ResponseGenerator, Result, Synthesizer, Transcriber, Transcript, Translation, Translator,
};

macro_rules! unavailable_stub {
    ($name:ident, $operation:expr, $id:literal, $hint:literal) => {
        pub struct $name {
            hint: String,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    hint: $hint.to_string(),
                }
            }
        }

        impl $name {
            pub fn with_hint(hint: impl Into<String>) -> Self {
                Self { hint: hint.into() }
            }

            fn refuse<T>(&self) -> Result<T> {
                Err(Error::unavailable($operation, self.hint.clone()))
            }
        }

        #[async_trait]
        impl Backend for $name {
            fn id(&self) -> &str {
                $id
            }

            fn tier(&self) -> BackendTier {
                BackendTier::Local
            }

            async fn probe(&self) -> Availability {
                Availability::unavailable(self.hint.clone())
            }
        }
    };
}

unavailable_stub!(
    UnavailableTranscriber,
    OperationKind::Stt,
    "stt-unavailable",
    "no speech recognizer is usable; configure a cloud API key or run the local recognizer sidecar with a model installed"
);

unavailable_stub!(
    UnavailableSynthesizer,
    OperationKind::Tts,
    "tts-unavailable",
    "no speech synthesizer is usable; configure a cloud API key or run the local synthesizer sidecar"
);

unavailable_stub!(
    UnavailableTranslator,
    OperationKind::Translate,
    "translate-unavailable",
    "no translator is usable; configure a cloud API key or run the local translation sidecar with language packs installed"
);

unavailable_stub!(
    UnavailableGenerator,
    OperationKind::Generate,
    "generate-unavailable",
    "no conversational model is usable; configure a cloud API key"
);

#[async_trait]
impl Transcriber for UnavailableTranscriber {
    async fn transcribe(&self, _audio: &AudioClip, _language: Language) -> Result<Transcript> {
        self.refuse()
    }
}

#[async_trait]
impl Synthesizer for UnavailableSynthesizer {
    async fn synthesize(&self, _text: &str, _language: Language) -> Result<AudioClip> {
        self.refuse()
    }
}

#[async_trait]
impl Translator for UnavailableTranslator {
    async fn translate(
        &self,
        _text: &str,
        _source: Option<Language>,
        _target: Language,
    ) -> Result<Translation> {
        self.refuse()
    }
}

#[async_trait]
impl ResponseGenerator for UnavailableGenerator {
    async fn generate(
        &self,
        _utterance: &str,
        _context: &[PromptTurn],
        _language: Language,
    ) -> Result<String> {
        self.refuse()
    }
}
