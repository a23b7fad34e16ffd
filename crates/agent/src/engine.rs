//! Conversation engine
//!
//! Drives one turn through its phases: `received` -> `classified` ->
//! `routed` -> `responded` -> `logged`. `responded` is always reached: a
//! failed or unavailable sub-operation substitutes a plain-text explanation
//! and marks the turn degraded instead of aborting it. No turn is silently
//! dropped; cancelled turns (session reset while in flight) are reported
//! as cancelled, not lost.

use crate::analytics::{AnalyticsAggregator, AnalyticsSnapshot};
use crate::session::{SessionDefaults, SessionManager};
use chrono::Utc;
use polyglot_core::{
    AudioClip, BackendUsage, IntentLabel, Language, Mode, Turn, TurnPhase,
};
use polyglot_persistence::{TranslationEntry, TranslationSink, TurnSink};
use polyglot_pipeline::{RouteError, ServiceRouter};
use polyglot_text_processing::{IntentClassifier, LanguageDetector};
use std::sync::Arc;

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Exchanges handed to the generator as prompt context
    pub prompt_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { prompt_window: 5 }
    }
}

/// What the user submitted
#[derive(Debug, Clone)]
pub enum TurnInput {
    Text(String),
    Audio(AudioClip),
}

/// One call into `submit_turn`
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub input: TurnInput,
    pub mode: Mode,
    /// Sticky override of the session's response/translation language
    pub target_language: Option<Language>,
    /// Sticky override of the translation source; sessions default to
    /// auto-detect
    pub source_language: Option<Language>,
    /// Synthesize the response to audio as well
    pub speak: bool,
}

impl TurnRequest {
    pub fn text(input: impl Into<String>) -> Self {
        Self {
            input: TurnInput::Text(input.into()),
            mode: Mode::Auto,
            target_language: None,
            source_language: None,
            speak: false,
        }
    }

    pub fn audio(clip: AudioClip) -> Self {
        Self {
            input: TurnInput::Audio(clip),
            mode: Mode::Auto,
            target_language: None,
            source_language: None,
            speak: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target_language(mut self, language: Language) -> Self {
        self.target_language = Some(language);
        self
    }

    pub fn with_speech(mut self) -> Self {
        self.speak = true;
        self
    }
}

/// A completed turn as returned to the presentation layer
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub turn: Turn,
    /// Synthesized response audio when requested and available
    pub audio: Option<AudioClip>,
    pub phase: TurnPhase,
}

/// Typed outcome of `submit_turn`; never an unhandled fault
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Completed(TurnResult),
    /// The session was reset while this turn was in flight; its result was
    /// discarded and nothing was committed
    Cancelled { session_id: String },
}

/// Orchestrates turns across sessions
pub struct ConversationEngine {
    router: Arc<ServiceRouter>,
    classifier: IntentClassifier,
    detector: LanguageDetector,
    sessions: SessionManager,
    analytics: Arc<AnalyticsAggregator>,
    history: Arc<dyn TurnSink>,
    translations: Arc<dyn TranslationSink>,
    config: EngineConfig,
}

impl ConversationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: Arc<ServiceRouter>,
        classifier: IntentClassifier,
        detector: LanguageDetector,
        defaults: SessionDefaults,
        analytics: Arc<AnalyticsAggregator>,
        history: Arc<dyn TurnSink>,
        translations: Arc<dyn TranslationSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            router,
            classifier,
            detector,
            sessions: SessionManager::new(defaults),
            analytics,
            history,
            translations,
            config,
        }
    }

    pub fn router(&self) -> &Arc<ServiceRouter> {
        &self.router
    }

    pub fn history(&self) -> &Arc<dyn TurnSink> {
        &self.history
    }

    pub fn translations(&self) -> &Arc<dyn TranslationSink> {
        &self.translations
    }

    /// Analytics view, optionally restricted to one session
    pub fn get_snapshot(&self, session_id: Option<&str>) -> AnalyticsSnapshot {
        self.analytics.snapshot(session_id)
    }

    /// Mint a fresh session with the configured defaults
    pub fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.get_or_create(&id);
        tracing::info!(session = id.as_str(), "session created");
        id
    }

    /// Reset a session: clear history, cancel its in-flight turn
    pub fn reset_session(&self, session_id: &str) -> bool {
        self.sessions.reset(session_id)
    }

    /// Process one turn end to end
    pub async fn submit_turn(&self, session_id: &str, request: TurnRequest) -> TurnOutcome {
        let session = self.sessions.get_or_create(session_id);
        // Serializes turns within this session; other sessions proceed
        // independently.
        let _turn_guard = session.turn_lock.lock().await;

        let requested_at = Utc::now();
        let mode = request.mode;
        let (epoch, sequence, recent, target_language, source_language) =
            session.with_state(|state| {
                state.store.set_mode(mode);
                if let Some(language) = request.target_language {
                    state.store.set_target_language(language);
                }
                if let Some(language) = request.source_language {
                    state.store.set_source_language(Some(language));
                }
                (
                    state.epoch,
                    state.store.next_sequence(),
                    state.store.recent(state.store.len()),
                    state.store.target_language(),
                    state.store.source_language(),
                )
            });
        tracing::debug!(session = session_id, sequence, %mode, phase = ?TurnPhase::Received, "turn received");

        let mut usage = BackendUsage::default();
        let mut fallback_occurred = false;
        let mut degraded = false;
        let mut audio_out = None;

        // Transcribe audio input first; a failure degrades the turn but
        // still produces a complete, logged record.
        let (input_text, input_language) = match &request.input {
            TurnInput::Text(text) => {
                let language = self.detector.detect(text);
                (text.clone(), language)
            }
            TurnInput::Audio(clip) => {
                let hint = clip.language.unwrap_or(target_language);
                match self.router.transcribe(clip, hint, mode).await {
                    Ok(routed) => {
                        usage.transcription = Some(routed.backend);
                        fallback_occurred |= routed.fallback_occurred;
                        let language = routed.value.language;
                        (routed.value.text, language)
                    }
                    Err(e) => {
                        degraded = true;
                        let turn = self.degraded_turn(sequence, &e, requested_at);
                        return self.commit(session_id, &session, epoch, turn, None).await;
                    }
                }
            }
        };

        let intent = self.classifier.classify(&input_text, &recent);
        tracing::debug!(session = session_id, sequence, %intent, phase = ?TurnPhase::Classified, "intent classified");

        // Route the response. Unknown routes like general conversation but
        // keeps its own label for analytics.
        let (response, response_language) = match intent {
            IntentLabel::TranslationRequest => {
                match self
                    .router
                    .translate(&input_text, source_language, target_language, mode)
                    .await
                {
                    Ok(routed) => {
                        usage.translation = Some(routed.backend.clone());
                        fallback_occurred |= routed.fallback_occurred;
                        let translation = routed.value;
                        if let Err(e) = self
                            .translations
                            .append(&TranslationEntry {
                                original: input_text.clone(),
                                translated: translation.text.clone(),
                                source: translation.source.code().to_string(),
                                target: translation.target,
                            })
                            .await
                        {
                            tracing::warn!(error = %e, "failed to append translation log");
                        }
                        (translation.text, translation.target)
                    }
                    Err(e) => {
                        degraded = true;
                        (e.user_message(), Language::English)
                    }
                }
            }
            _ => {
                let context = prompt_context(&recent, self.config.prompt_window);
                match self
                    .router
                    .generate(&input_text, &context, target_language, mode)
                    .await
                {
                    Ok(routed) => {
                        usage.generation = Some(routed.backend);
                        fallback_occurred |= routed.fallback_occurred;
                        (routed.value, target_language)
                    }
                    Err(e) => {
                        degraded = true;
                        (e.user_message(), Language::English)
                    }
                }
            }
        };
        tracing::debug!(session = session_id, sequence, phase = ?TurnPhase::Routed, "sub-operations routed");

        // Speech synthesis failure only annotates the turn; the text
        // response stands.
        if request.speak && !degraded {
            match self.router.synthesize(&response, response_language, mode).await {
                Ok(routed) => {
                    usage.synthesis = Some(routed.backend);
                    fallback_occurred |= routed.fallback_occurred;
                    audio_out = Some(routed.value);
                }
                Err(e) => {
                    tracing::warn!(session = session_id, sequence, error = %e, "speech synthesis unavailable for this turn");
                }
            }
        }

        let turn = Turn {
            sequence,
            input: input_text,
            input_language,
            intent,
            response,
            response_language,
            requested_at,
            responded_at: Utc::now(),
            backends: usage,
            fallback_occurred,
            degraded,
        };
        tracing::debug!(session = session_id, sequence, phase = ?TurnPhase::Responded, degraded, "response produced");

        self.commit(session_id, &session, epoch, turn, audio_out).await
    }

    /// Build the degraded turn used when transcription itself fails
    fn degraded_turn(
        &self,
        sequence: u64,
        error: &RouteError,
        requested_at: chrono::DateTime<Utc>,
    ) -> Turn {
        Turn {
            sequence,
            input: String::new(),
            input_language: self.detector.detect(""),
            intent: IntentLabel::Unknown,
            response: error.user_message(),
            response_language: Language::English,
            requested_at,
            responded_at: Utc::now(),
            backends: BackendUsage::default(),
            fallback_occurred: false,
            degraded: true,
        }
    }

    /// Append to the context store, persist the record, feed analytics.
    /// A reset between start and commit discards the result.
    async fn commit(
        &self,
        session_id: &str,
        session: &crate::session::Session,
        epoch: u64,
        turn: Turn,
        audio: Option<AudioClip>,
    ) -> TurnOutcome {
        let committed = session.with_state(|state| {
            if state.epoch != epoch {
                return false;
            }
            match state.store.append(turn.clone()) {
                Ok(()) => true,
                Err(e) => {
                    // unreachable under the turn lock; kept as a guard
                    tracing::error!(session = session_id, error = %e, "context append rejected");
                    false
                }
            }
        });
        if !committed {
            tracing::info!(session = session_id, sequence = turn.sequence, "turn discarded by session reset");
            return TurnOutcome::Cancelled {
                session_id: session_id.to_string(),
            };
        }

        let record = turn.to_record(session_id);
        if let Err(e) = self.history.append(&record).await {
            // history loss must not fail the turn
            tracing::warn!(session = session_id, error = %e, "failed to persist turn record");
        }
        self.analytics.ingest(&record);
        tracing::info!(
            session = session_id,
            sequence = turn.sequence,
            intent = %turn.intent,
            degraded = turn.degraded,
            fallback = turn.fallback_occurred,
            phase = ?TurnPhase::Logged,
            "turn logged"
        );

        TurnOutcome::Completed(TurnResult {
            turn,
            audio,
            phase: TurnPhase::Logged,
        })
    }
}

fn prompt_context(recent: &[Turn], window: usize) -> Vec<polyglot_core::PromptTurn> {
    let take = window.min(recent.len());
    recent[recent.len() - take..]
        .iter()
        .map(|t| polyglot_core::PromptTurn {
            user: t.input.clone(),
            assistant: t.response.clone(),
        })
        .collect()
}
