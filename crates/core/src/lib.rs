//! Core traits and types for the multilingual assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable backends (STT, TTS, translation, generation)
//! - Capability model (operation kinds, tiers, descriptors)
//! - Language definitions (16 supported languages)
//! - Conversation types (turns, intents, modes)
//! - Error types

pub mod audio;
pub mod capability;
pub mod conversation;
pub mod error;
pub mod language;
pub mod traits;

pub use audio::{AudioClip, AudioFormat};
pub use capability::{
    Availability, BackendDescriptor, BackendPriority, BackendTier, CapabilityMap, OperationKind,
};
pub use conversation::{BackendUsage, IntentLabel, Mode, Turn, TurnPhase, TurnRecord};
pub use error::{Error, Result, TransientKind};
pub use language::Language;
pub use traits::{
    Backend, PromptTurn, ResponseGenerator, Synthesizer, Transcriber, Transcript, Translation,
    Translator,
};
