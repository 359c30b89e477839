//! LLM integration for the code agent.
//!
//! The pipeline only depends on the [`ReplyGenerator`] trait. The production
//! implementation talks to OpenRouter's OpenAI-compatible chat-completions
//! endpoint over reqwest.

pub mod openrouter;
pub mod prompts;

pub use openrouter::{ChatMessage, OpenRouterProvider};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Drafts a freelancer reply for a task description.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Generate a reply. Every failure is reported as an `LlmError`; callers
    /// decide what to answer instead.
    async fn generate(&self, description: &str) -> Result<String, LlmError>;
}

/// Create the reply generator from configuration.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn ReplyGenerator>, LlmError> {
    let provider = OpenRouterProvider::new(config)?;
    if config.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY not set; every order will get the fallback reply");
    }
    tracing::info!(model = %config.model, "Using OpenRouter");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_generator_without_key_still_constructs() {
        let generator = create_generator(&LlmConfig::default()).unwrap();
        assert_eq!(generator.model_name(), "openchat/openchat-7b");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let config = LlmConfig {
            endpoint: "http://127.0.0.1:9/unreachable".into(),
            ..LlmConfig::default()
        };
        let generator = create_generator(&config).unwrap();
        let err = generator.generate("парсинг сайта").await.unwrap_err();
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }
}
