//! LLM Provider layer
//!
//! The agent loop only needs one capability from a model: take an ordered
//! list of role-tagged turns and return one text response. `CompletionModel`
//! is that seam; `ProviderClient` implements it for any API following the
//! OpenAI chat completions spec.

mod client;
mod config;

pub use client::*;
pub use config::*;

use crate::message::ChatMessage;
use async_trait::async_trait;

/// Failure of a completion call
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("API call failed: {0}")]
    Api(#[from] async_openai::error::OpenAIError),
    #[error("model returned no content")]
    EmptyResponse,
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str {
        "unknown"
    }
}

/// Stand-in used when no provider could be configured; every call fails with
/// the configuration error so tasks end with the usual model-failure reply
#[derive(Debug, Clone)]
pub struct UnconfiguredModel {
    reason: String,
}

impl UnconfiguredModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CompletionModel for UnconfiguredModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_model_always_fails() {
        let model = UnconfiguredModel::new("OPENAI_API_KEY not found");
        let err = model.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(err.to_string(), "OPENAI_API_KEY not found");
        assert_eq!(model.model_name(), "unknown");
    }
}
