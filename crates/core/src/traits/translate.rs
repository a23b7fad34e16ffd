//! Translation trait

use super::Backend;
use crate::error::Result;
use crate::language::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A completed translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    /// What the backend resolved `source: None` (auto-detect) to
    pub source: Language,
    pub target: Language,
}

/// Text translation interface
///
/// `source: None` asks the backend to auto-detect; backends that cannot
/// auto-detect apply the caller-supplied detection policy upstream and
/// never guess silently.
#[async_trait]
pub trait Translator: Backend {
    async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<Translation>;
}
