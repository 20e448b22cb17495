//! Text-interpretation capability
//!
//! The extractor only needs "send a prompt, get text back". Anything that can
//! do that (a hosted model, a local model, a canned test double) implements
//! [`CriteriaInterpreter`].

use async_trait::async_trait;

use crate::error::ExtractResult;

/// A chat-style prompt: system instructions plus the user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Interpreter backend interface
#[async_trait]
pub trait CriteriaInterpreter: Send + Sync {
    /// Backend name, for logs and responses
    fn name(&self) -> &str;

    /// Send the prompt and return the raw reply text
    ///
    /// Implementations own their timeout and retry policy.
    async fn interpret(&self, prompt: &Prompt) -> ExtractResult<String>;
}
