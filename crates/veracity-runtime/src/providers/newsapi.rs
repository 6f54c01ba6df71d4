//! NewsAPI `/v2/everything` search.
//!
//! Needs an API key from `options.api_key` or `NEWSAPI_KEY`. Without one
//! the provider is still built and reports `Empty` at fetch time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use veracity_core::Article;

use crate::config::{ConfigError, ProviderConfig};

use super::factory::ProviderFactory;
use super::http::{build_client, check_status, option_str, option_usize, transport_error, validate_base_url};
use super::secrets::ApiCredential;
use super::{clip_description, EvidenceProvider, ProviderError};

/// Environment variable name for the NewsAPI key.
pub const NEWSAPI_KEY_ENV: &str = "NEWSAPI_KEY";

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Title NewsAPI substitutes for takedown-redacted articles.
const REMOVED_MARKER: &str = "[Removed]";

pub struct NewsApi {
    credential: Option<ApiCredential>,
    client: reqwest::Client,
    base_url: String,
    language: String,
    lookback_days: i64,
    max_results: usize,
    timeout: Duration,
}

impl std::fmt::Debug for NewsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApi")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("lookback_days", &self.lookback_days)
            .finish()
    }
}

impl NewsApi {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let options = &config.options;
        Ok(Self {
            credential: ApiCredential::from_options(options, NEWSAPI_KEY_ENV, "NewsAPI key"),
            client: build_client(&config.id, config.timeout)?,
            base_url: option_str(options, "base_url", DEFAULT_BASE_URL),
            language: option_str(options, "language", "en"),
            lookback_days: option_usize(options, "lookback_days", 7) as i64,
            max_results: option_usize(options, "max_results", 10),
            timeout: config.timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: NewsApiSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[async_trait]
impl EvidenceProvider for NewsApi {
    fn name(&self) -> &str {
        "newsapi"
    }

    fn skip_reason(&self) -> Option<String> {
        self.credential
            .is_none()
            .then(|| format!("missing credentials: set api_key or {}", NEWSAPI_KEY_ENV))
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("NewsAPI key".to_string()))?;

        let from = (Utc::now() - chrono::Duration::days(self.lookback_days))
            .format("%Y-%m-%d")
            .to_string();
        let page_size = self.max_results.to_string();

        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            // SECURITY: Only expose the credential here, at the point of use
            .header("X-Api-Key", credential.expose())
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("language", self.language.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let body: EverythingResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(normalize_articles(body.articles, self.max_results))
    }
}

/// Keep articles with a title and URL, skipping redacted entries.
fn normalize_articles(articles: Vec<NewsApiArticle>, max: usize) -> Vec<Article> {
    articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != REMOVED_MARKER)?;
            let url = a.url.filter(|u| !u.trim().is_empty())?;
            Some(Article {
                title: title.trim().to_string(),
                source: a.source.name.unwrap_or_else(|| "NewsAPI".to_string()),
                url,
                published_at: a
                    .published_at
                    .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
                    .map(|d| d.with_timezone(&Utc)),
                description: clip_description(a.description.as_deref()),
                provider_id: String::new(),
            })
        })
        .take(max)
        .collect()
}

/// Factory for [`NewsApi`].
///
/// ## Configuration Format
/// ```yaml
/// - id: newsapi
///   type: newsapi
///   options:
///     api_key: "..."     # optional, falls back to NEWSAPI_KEY env
///     language: en       # optional
///     lookback_days: 7   # optional
///     max_results: 10    # optional
/// ```
pub struct NewsApiFactory;

impl ProviderFactory for NewsApiFactory {
    fn provider_type(&self) -> &'static str {
        "newsapi"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EvidenceProvider>, ConfigError> {
        let provider = NewsApi::from_config(config)?;
        if provider.credential.is_none() {
            tracing::info!(provider = %config.id, "NewsAPI key not set; provider will be skipped");
        }
        Ok(Arc::new(provider))
    }

    fn validate_config(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        validate_base_url(&config.options)
    }

    fn description(&self) -> &'static str {
        "NewsAPI everything search (API key)"
    }
}
