//! Independent cross-check over a reasoning provider.
//!
//! An [`LlmProvider`] wraps one external reasoning API. The
//! [`CrossCheckAdapter`] asks it a single fact-check question under a
//! deadline and turns whatever happens into a [`CrossCheckOpinion`]:
//! nothing raised here ever reaches the orchestrator.
//!
//! [`CrossCheckOpinion`]: veracity_core::CrossCheckOpinion

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, CrossCheckConfig};

mod adapter;

#[cfg(feature = "gemini")]
mod gemini;

pub use adapter::{parse_opinion, CrossCheckAdapter, ParsedOpinion};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GEMINI_API_KEY_ENV};

/// Errors from reasoning providers. Never leave a [`CrossCheckAdapter`].
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 512,
            temperature: 0.0,
            timeout: Duration::from_secs(8),
        }
    }
}

impl From<&CrossCheckConfig> for CompletionConfig {
    fn from(config: &CrossCheckConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: 0.0,
            timeout: config.timeout,
        }
    }
}

/// A chat message for completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,

    pub usage: TokenUsage,

    /// Model that answered
    pub model: String,

    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Reasoning provider abstraction.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion. Single attempt, no retries.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, LlmError>;

    /// Whether the provider can be called at all (e.g. has credentials).
    async fn health_check(&self) -> bool;

    fn name(&self) -> &str;
}

/// Reasoning provider types compiled into this build.
pub fn available_llm_providers() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut types = Vec::new();
    #[cfg(feature = "gemini")]
    types.push("gemini");
    types
}

/// Build the reasoning provider named by `config.provider`.
pub fn llm_provider_from_config(config: &CrossCheckConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    match config.provider.as_str() {
        #[cfg(feature = "gemini")]
        "gemini" => Ok(Arc::new(GeminiProvider::from_config(config)?)),
        other => Err(ConfigError::UnknownProviderType {
            kind: other.to_string(),
            available: available_llm_providers().into_iter().map(String::from).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
    }

    #[test]
    fn test_completion_config_from_cross_check() {
        let mut cross_check = CrossCheckConfig::default();
        cross_check.model = "gemini-2.0-flash".to_string();
        cross_check.max_tokens = 128;

        let completion = CompletionConfig::from(&cross_check);
        assert_eq!(completion.model, "gemini-2.0-flash");
        assert_eq!(completion.max_tokens, 128);
        assert_eq!(completion.timeout, cross_check.timeout);
        assert_eq!(completion.temperature, 0.0);
    }

    #[test]
    fn test_unknown_llm_provider() {
        let mut cross_check = CrossCheckConfig::default();
        cross_check.provider = "oracle".to_string();

        assert!(matches!(
            llm_provider_from_config(&cross_check),
            Err(ConfigError::UnknownProviderType { .. })
        ));
    }
}
