//! Text processing for the multilingual assistant
//!
//! Two pure, total, in-process functions run on every turn:
//! - intent classification over an explicit ordered rule table
//! - language detection with a configurable default-fallback policy
//!
//! Neither consults external services; both are cheap enough to run
//! unconditionally per turn.

pub mod intent;
pub mod langdetect;

pub use intent::{IntentClassifier, IntentRule};
pub use langdetect::{DetectorConfig, LanguageDetector};
