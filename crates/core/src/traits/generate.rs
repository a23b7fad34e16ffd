//! Conversational response generation trait

use super::Backend;
use crate::error::Result;
use crate::language::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One prior exchange handed to the generator as context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub user: String,
    pub assistant: String,
}

/// Conversational AI interface
///
/// The engine passes the bounded recent-context window (the context store
/// caps it); generators must not accumulate their own history.
#[async_trait]
pub trait ResponseGenerator: Backend {
    /// Generate a reply to `utterance` in `language`, given recent context
    async fn generate(
        &self,
        utterance: &str,
        context: &[PromptTurn],
        language: Language,
    ) -> Result<String>;
}
