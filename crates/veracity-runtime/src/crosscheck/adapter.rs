//! The cross-check adapter and its reply parser.

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use veracity_core::{CrossCheckOpinion, Label};

use super::{llm_provider_from_config, ChatMessage, CompletionConfig, LlmProvider};
use crate::config::{ConfigError, CrossCheckConfig};
use crate::prompts::{fact_check_message, FACT_CHECK_SYSTEM_PROMPT};

/// Confidence assumed when the reply states none.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

lazy_static! {
    static ref CLASSIFICATION: Regex = Regex::new(r"\b(FAKE|REAL|UNCERTAIN)\b").unwrap();
    static ref PERCENT: Regex = Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").unwrap();
}

/// What a fact-check reply said.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOpinion {
    /// `None` for UNCERTAIN
    pub label: Option<Label>,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// Parse a fact-check reply. `None` when it names no classification.
///
/// The classification comes from the first line containing
/// "classification" that names one, else the first line that names one.
/// The confidence comes from the first line mentioning "confidence".
pub fn parse_opinion(reply: &str) -> Option<ParsedOpinion> {
    let lines: Vec<&str> = reply.lines().collect();

    let classification = lines
        .iter()
        .filter(|l| l.to_lowercase().contains("classification"))
        .chain(lines.iter())
        .find_map(|l| {
            CLASSIFICATION
                .captures(&l.to_uppercase())
                .map(|c| c[1].to_string())
        })?;

    let label = match classification.as_str() {
        "FAKE" => Some(Label::Fake),
        "REAL" => Some(Label::Real),
        _ => None,
    };

    let confidence = lines
        .iter()
        .find(|l| l.to_lowercase().contains("confidence"))
        .and_then(|l| PERCENT.captures(l))
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|p| (p / 100.0).clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let reasoning = lines
        .iter()
        .find(|l| l.to_lowercase().contains("reasoning"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, rest)| rest.trim().trim_matches('*').trim().to_string())
        .filter(|r| !r.is_empty());

    Some(ParsedOpinion {
        label,
        confidence,
        reasoning,
    })
}

/// Asks the reasoning provider for an independent opinion.
///
/// Disabled, slow, failing or unparseable all come back as
/// [`CrossCheckOpinion::unavailable`].
#[derive(Clone)]
pub struct CrossCheckAdapter {
    provider: Option<Arc<dyn LlmProvider>>,
    completion: CompletionConfig,
}

impl CrossCheckAdapter {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider: Some(provider),
            completion,
        }
    }

    pub fn disabled() -> Self {
        Self {
            provider: None,
            completion: CompletionConfig::default(),
        }
    }

    pub fn from_config(config: &CrossCheckConfig) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        Ok(Self::new(llm_provider_from_config(config)?, CompletionConfig::from(config)))
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Own timeout; zero when disabled.
    pub fn timeout(&self) -> Duration {
        if self.is_enabled() {
            self.completion.timeout
        } else {
            Duration::ZERO
        }
    }

    /// One attempt under the earlier of `deadline` and the own timeout.
    pub async fn check(&self, text: &str, deadline: Instant) -> CrossCheckOpinion {
        let Some(provider) = &self.provider else {
            return CrossCheckOpinion::unavailable();
        };

        if !provider.health_check().await {
            tracing::debug!(provider = provider.name(), "Cross-check provider not ready");
            return CrossCheckOpinion::unavailable();
        }

        let started = Instant::now();
        let deadline = deadline.min(started + self.completion.timeout);
        let messages = vec![
            ChatMessage::system(FACT_CHECK_SYSTEM_PROMPT.trim()),
            ChatMessage::user(fact_check_message(text)),
        ];

        match tokio::time::timeout_at(deadline, provider.complete(messages, &self.completion)).await {
            Ok(Ok(response)) => match parse_opinion(&response.content) {
                Some(parsed) => {
                    tracing::debug!(
                        provider = provider.name(),
                        label = ?parsed.label,
                        confidence = parsed.confidence,
                        tokens = response.usage.total(),
                        elapsed = ?started.elapsed(),
                        "Cross-check answered"
                    );
                    CrossCheckOpinion::answered(parsed.label, parsed.confidence, parsed.reasoning)
                }
                None => {
                    tracing::warn!(provider = provider.name(), "Cross-check reply had no classification");
                    CrossCheckOpinion::unavailable()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(provider = provider.name(), error = %e, "Cross-check failed");
                CrossCheckOpinion::unavailable()
            }
            Err(_) => {
                tracing::warn!(provider = provider.name(), elapsed = ?started.elapsed(), "Cross-check missed deadline");
                CrossCheckOpinion::unavailable()
            }
        }
    }
}

impl std::fmt::Debug for CrossCheckAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossCheckAdapter")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("model", &self.completion.model)
            .field("timeout", &self.completion.timeout)
            .finish()
    }
}
