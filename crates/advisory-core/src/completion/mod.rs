//! Completion service contract.
//!
//! The agent unit talks to the model through [`CompletionService`]; the
//! production adapter is [`openai::OpenAiCompletion`], tests inject
//! [`crate::fakes::StubCompletion`].

pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat-completion call: a system prompt, a user prompt and a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

/// Failures of the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Return the model's response text for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
