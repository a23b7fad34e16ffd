//! Concrete backend implementations and the registered backend set

mod http;
mod stub;

pub use http::{
    CloudGenerator, CloudSynthesizer, CloudTranscriber, CloudTranslator, EndpointConfig,
    SidecarSynthesizer, SidecarTranscriber, SidecarTranslator,
};
pub use stub::{UnavailableGenerator, UnavailableSynthesizer, UnavailableTranscriber, UnavailableTranslator};

use polyglot_core::{ResponseGenerator, Synthesizer, Transcriber, Translator};
use std::sync::Arc;

/// The ordered backend candidate lists for every operation kind
///
/// Registration order is attempt order: register cloud backends first so
/// `auto` mode is cloud-first. The builder appends an explain-to-user stub
/// to every list, so no operation ever has zero candidates.
pub struct BackendSet {
    stt: Vec<Arc<dyn Transcriber>>,
    tts: Vec<Arc<dyn Synthesizer>>,
    translate: Vec<Arc<dyn Translator>>,
    generate: Vec<Arc<dyn ResponseGenerator>>,
}

impl BackendSet {
    pub fn builder() -> BackendSetBuilder {
        BackendSetBuilder::default()
    }

    pub fn stt(&self) -> &[Arc<dyn Transcriber>] {
        &self.stt
    }

    pub fn tts(&self) -> &[Arc<dyn Synthesizer>] {
        &self.tts
    }

    pub fn translate(&self) -> &[Arc<dyn Translator>] {
        &self.translate
    }

    pub fn generate(&self) -> &[Arc<dyn ResponseGenerator>] {
        &self.generate
    }
}

/// Builder collecting backends in priority order
#[derive(Default)]
pub struct BackendSetBuilder {
    stt: Vec<Arc<dyn Transcriber>>,
    tts: Vec<Arc<dyn Synthesizer>>,
    translate: Vec<Arc<dyn Translator>>,
    generate: Vec<Arc<dyn ResponseGenerator>>,
}

impl BackendSetBuilder {
    pub fn stt(mut self, backend: Arc<dyn Transcriber>) -> Self {
        self.stt.push(backend);
        self
    }

    pub fn tts(mut self, backend: Arc<dyn Synthesizer>) -> Self {
        self.tts.push(backend);
        self
    }

    pub fn translate(mut self, backend: Arc<dyn Translator>) -> Self {
        self.translate.push(backend);
        self
    }

    pub fn generate(mut self, backend: Arc<dyn ResponseGenerator>) -> Self {
        self.generate.push(backend);
        self
    }

    /// Finish the set, appending the degraded stub for each operation
    pub fn build(mut self) -> BackendSet {
        self.stt.push(Arc::new(UnavailableTranscriber::default()));
        self.tts.push(Arc::new(UnavailableSynthesizer::default()));
        self.translate.push(Arc::new(UnavailableTranslator::default()));
        self.generate.push(Arc::new(UnavailableGenerator::default()));
        BackendSet {
            stt: self.stt,
            tts: self.tts,
            translate: self.translate,
            generate: self.generate,
        }
    }
}
