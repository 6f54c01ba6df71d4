//! Google Gemini provider (`generateContent`).
//!
//! ## Security
//!
//! The API key goes through [`ApiCredential`] and is exposed only in the
//! request header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmError, LlmProvider, TokenUsage};
use crate::config::{ConfigError, CrossCheckConfig};
use crate::providers::secrets::{ApiCredential, CredentialSource};

/// Environment variable name for the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider. Built without a key, it reports unhealthy and the
/// cross-check stays unavailable.
pub struct GeminiProvider {
    credential: Option<ApiCredential>,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            credential: Some(ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Gemini API key",
            )),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_client()?,
        })
    }

    /// `options.api_key`, falling back to `GEMINI_API_KEY`.
    pub fn from_config(config: &CrossCheckConfig) -> Result<Self, ConfigError> {
        let options = &config.options;
        if let Some(url) = options["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(
                    "cross_check.options.base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        let credential = ApiCredential::from_options(options, GEMINI_API_KEY_ENV, "Gemini API key");
        if credential.is_none() {
            tracing::info!("Gemini API key not set; cross-check will be unavailable");
        }

        Ok(Self {
            credential,
            base_url: options["base_url"]
                .as_str()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: build_client()?,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

fn build_client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(concat!("veracity/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::ProviderInit {
            id: "gemini".to_string(),
            reason: e.to_string(),
        })
}

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn build_request(messages: Vec<ChatMessage>, config: &CompletionConfig) -> GenerateRequest {
    let mut system = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        let part = Part { text: Some(msg.content) };
        match msg.role.as_str() {
            "system" => system.push(part),
            "assistant" => contents.push(Content { role: Some("model".to_string()), parts: vec![part] }),
            _ => contents.push(Content { role: Some("user".to_string()), parts: vec![part] }),
        }
    }

    GenerateRequest {
        contents,
        system_instruction: (!system.is_empty()).then_some(Content { role: None, parts: system }),
        generation_config: GenerationConfig {
            max_output_tokens: config.max_tokens,
            temperature: config.temperature,
        },
    }
}

fn into_completion(body: GenerateResponse, requested_model: &str) -> Result<CompletionResponse, LlmError> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Parse("response has no candidates".to_string()))?;

    let content = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    let usage = body.usage_metadata.unwrap_or_default();
    Ok(CompletionResponse {
        content,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
        },
        model: body.model_version.unwrap_or_else(|| requested_model.to_string()),
        stop_reason: candidate.finish_reason,
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, LlmError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| LlmError::NotConfigured(format!("set api_key or {}", GEMINI_API_KEY_ENV)))?;

        let request = build_request(messages, config);

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, config.model))
            .header("x-goog-api-key", credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(config.timeout)
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .json::<GeminiError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|e| e.to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        into_completion(body, &config.model)
    }

    async fn health_check(&self) -> bool {
        self.credential.is_some()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_splits_system_instruction() {
        let request = build_request(
            vec![ChatMessage::system("be careful"), ChatMessage::user("is this real?")],
            &CompletionConfig::default(),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be careful");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "is this real?");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_into_completion() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "1. Classification: FAKE\n"}, {"text": "2. Confidence: 90%"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 30, "totalTokenCount": 150},
                "modelVersion": "gemini-2.5-flash"
            }"#,
        )
        .unwrap();

        let completion = into_completion(body, "requested").unwrap();
        assert_eq!(completion.content, "1. Classification: FAKE\n2. Confidence: 90%");
        assert_eq!(completion.usage.total(), 150);
        assert_eq!(completion.model, "gemini-2.5-flash");
        assert_eq!(completion.stop_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_no_candidates_is_parse_error() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(into_completion(body, "m"), Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_inline_key_is_healthy_and_redacted() {
        let mut config = CrossCheckConfig::default();
        config.options = serde_json::json!({ "api_key": "g-secret" });

        let provider = GeminiProvider::from_config(&config).unwrap();
        assert!(provider.health_check().await);
        assert!(!format!("{:?}", provider).contains("g-secret"));
    }
}
