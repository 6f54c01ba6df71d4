//! Pipeline configuration.
//!
//! Everything the pipeline needs is passed in explicitly at construction:
//! enabled providers, their order and timeouts, credentials, and the
//! global deadlines. Nothing is read from ambient state except the
//! credential environment fallbacks in [`crate::providers::secrets`].
//!
//! ## Example (YAML)
//!
//! ```yaml
//! min_text_length: 10
//! deadline_grace: 250ms
//! aggregation:
//!   deadline: 6s
//!   providers:
//!     - id: google-news
//!       type: google-news-rss
//!       timeout: 5s
//!     - id: newsapi
//!       type: newsapi
//!       options:
//!         lookback_days: 7
//! cross_check:
//!   enabled: true
//!   provider: gemini
//!   timeout: 8s
//! cache:
//!   ttl: 5m
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown provider type '{kind}'. Available: {available:?}")]
    UnknownProviderType { kind: String, available: Vec<String> },

    #[error("Failed to initialize provider '{id}': {reason}")]
    ProviderInit { id: String, reason: String },
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum number of characters (after trimming) accepted for analysis
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Allowed overhead above the slower branch deadline
    #[serde(default = "default_deadline_grace", with = "humantime_duration")]
    pub deadline_grace: Duration,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub cross_check: CrossCheckConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Evidence fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Shared deadline for every provider call in one request
    #[serde(default = "default_aggregation_deadline", with = "humantime_duration")]
    pub deadline: Duration,

    /// Providers in precedence order. Earlier providers win deduplication.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

/// One evidence provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique id, stamped on every article this provider returns
    pub id: String,

    /// Factory type (e.g. "google-news-rss", "newsapi", "serpapi")
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-provider timeout, capped by the shared aggregation deadline
    #[serde(default = "default_provider_timeout", with = "humantime_duration")]
    pub timeout: Duration,

    /// Provider-specific options (api_key, base_url, max_results, ...)
    #[serde(default)]
    pub options: JsonValue,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            enabled: true,
            timeout: default_provider_timeout(),
            options: JsonValue::Null,
        }
    }
}

/// Cross-check (auxiliary reasoning service) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Reasoning provider type
    #[serde(default = "default_cross_check_provider")]
    pub provider: String,

    #[serde(default = "default_cross_check_model")]
    pub model: String,

    #[serde(default = "default_cross_check_timeout", with = "humantime_duration")]
    pub timeout: Duration,

    #[serde(default = "default_cross_check_max_tokens")]
    pub max_tokens: u32,

    /// Provider-specific options (api_key, base_url)
    #[serde(default)]
    pub options: JsonValue,
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,

    #[serde(default = "default_cache_ttl", with = "humantime_duration")]
    pub ttl: Duration,
}

fn default_min_text_length() -> usize {
    10
}

fn default_deadline_grace() -> Duration {
    Duration::from_millis(250)
}

fn default_aggregation_deadline() -> Duration {
    Duration::from_secs(6)
}

fn default_provider_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

fn default_cross_check_provider() -> String {
    "gemini".to_string()
}

fn default_cross_check_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_cross_check_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_cross_check_max_tokens() -> u32 {
    512
}

fn default_cache_entries() -> u64 {
    1_000
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("google-news", "google-news-rss"),
        ProviderConfig::new("newsapi", "newsapi"),
        ProviderConfig::new("serpapi", "serpapi"),
    ]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            deadline_grace: default_deadline_grace(),
            aggregation: AggregationConfig::default(),
            cross_check: CrossCheckConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            deadline: default_aggregation_deadline(),
            providers: default_providers(),
        }
    }
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_cross_check_provider(),
            model: default_cross_check_model(),
            timeout: default_cross_check_timeout(),
            max_tokens: default_cross_check_max_tokens(),
            options: JsonValue::Null,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_cache_entries(),
            ttl: default_cache_ttl(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a YAML config.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_text_length == 0 {
            return Err(ConfigError::Invalid("min_text_length must be at least 1".to_string()));
        }

        if self.aggregation.deadline.is_zero() {
            return Err(ConfigError::Invalid("aggregation.deadline must be non-zero".to_string()));
        }

        let mut ids = HashSet::new();
        for provider in &self.aggregation.providers {
            if provider.id.trim().is_empty() {
                return Err(ConfigError::Invalid("provider id must not be empty".to_string()));
            }
            if !ids.insert(provider.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.timeout.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' timeout must be non-zero",
                    provider.id
                )));
            }
        }

        if self.cross_check.enabled && self.cross_check.timeout.is_zero() {
            return Err(ConfigError::Invalid("cross_check.timeout must be non-zero".to_string()));
        }

        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_entries must be non-zero when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Cross-check deadline, zero when the cross-check is disabled.
    pub fn cross_check_deadline(&self) -> Duration {
        if self.cross_check.enabled {
            self.cross_check.timeout
        } else {
            Duration::ZERO
        }
    }

    /// Upper bound on one `analyze` call: the slower branch plus grace.
    pub fn overall_deadline(&self) -> Duration {
        self.aggregation.deadline.max(self.cross_check_deadline()) + self.deadline_grace
    }
}

/// Serde adapter for durations written as "6s", "250ms", "5m".
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
