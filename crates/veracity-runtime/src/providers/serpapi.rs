//! SerpAPI Google News search (`tbm=nws`).
//!
//! Needs an API key from `options.api_key` or `SERPAPI_KEY`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use veracity_core::Article;

use crate::config::{ConfigError, ProviderConfig};

use super::factory::ProviderFactory;
use super::http::{build_client, check_status, option_str, option_usize, transport_error, validate_base_url};
use super::secrets::ApiCredential;
use super::{clip_description, EvidenceProvider, ProviderError};

/// Environment variable name for the SerpAPI key.
pub const SERPAPI_KEY_ENV: &str = "SERPAPI_KEY";

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

lazy_static! {
    static ref RELATIVE_DATE: Regex =
        Regex::new(r"(?i)^(\d+)\s+(second|sec|minute|min|hour|day|week|month|year)s?\s+ago$").unwrap();
}

pub struct SerpApi {
    credential: Option<ApiCredential>,
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
    timeout: Duration,
}

impl std::fmt::Debug for SerpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApi")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl SerpApi {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let options = &config.options;
        Ok(Self {
            credential: ApiCredential::from_options(options, SERPAPI_KEY_ENV, "SerpAPI key"),
            client: build_client(&config.id, config.timeout)?,
            base_url: option_str(options, "base_url", DEFAULT_BASE_URL),
            max_results: option_usize(options, "max_results", 10),
            timeout: config.timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<NewsResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: Option<String>,
    link: Option<String>,
    source: Option<SerpSource>,
    date: Option<String>,
    snippet: Option<String>,
}

/// SerpAPI returns the source as a plain string or as `{ "name": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SerpSource {
    Name(String),
    Object { name: Option<String> },
}

impl SerpSource {
    fn into_name(self) -> Option<String> {
        match self {
            SerpSource::Name(name) => Some(name),
            SerpSource::Object { name } => name,
        }
    }
}

#[async_trait]
impl EvidenceProvider for SerpApi {
    fn name(&self) -> &str {
        "serpapi"
    }

    fn skip_reason(&self) -> Option<String> {
        self.credential
            .is_none()
            .then(|| format!("missing credentials: set api_key or {}", SERPAPI_KEY_ENV))
    }

    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("SerpAPI key".to_string()))?;
        let num = self.max_results.to_string();

        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            // SECURITY: Only expose the credential here, at the point of use
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("tbm", "nws"),
                ("num", num.as_str()),
                ("api_key", credential.expose()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let body: SearchResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        normalize_response(body, self.max_results, Utc::now())
    }
}

fn normalize_response(
    body: SearchResponse,
    max: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Article>, ProviderError> {
    if let Some(error) = body.error {
        // SerpAPI reports an empty result page as an error string.
        if error.contains("hasn't returned any results") {
            return Ok(vec![]);
        }
        return Err(ProviderError::Api { status: 200, message: error });
    }

    Ok(body
        .news_results
        .into_iter()
        .filter_map(|r| {
            let title = r.title.filter(|t| !t.trim().is_empty())?;
            let url = r.link.filter(|u| !u.trim().is_empty())?;
            Some(Article {
                title: title.trim().to_string(),
                source: r
                    .source
                    .and_then(SerpSource::into_name)
                    .unwrap_or_else(|| "Google News".to_string()),
                url,
                published_at: r.date.as_deref().and_then(|d| parse_serp_date(d, now)),
                description: clip_description(r.snippet.as_deref()),
                provider_id: String::new(),
            })
        })
        .take(max)
        .collect())
}

/// Parse the date formats SerpAPI emits.
///
/// Accepts RFC 3339, relative dates ("3 hours ago"), "Mar 3, 2025" and
/// "03/14/2025, 07:00 AM, +0000 UTC". Anything else is `None`.
pub fn parse_serp_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }

    if let Some(caps) = RELATIVE_DATE.captures(raw) {
        let n: i64 = caps[1].parse().ok()?;
        // Out-of-range counts from the provider yield no date
        let delta = match caps[2].to_lowercase().as_str() {
            "second" | "sec" => TimeDelta::try_seconds(n),
            "minute" | "min" => TimeDelta::try_minutes(n),
            "hour" => TimeDelta::try_hours(n),
            "day" => TimeDelta::try_days(n),
            "week" => TimeDelta::try_weeks(n),
            "month" => n.checked_mul(30).and_then(TimeDelta::try_days),
            _ => n.checked_mul(365).and_then(TimeDelta::try_days),
        }?;
        return now.checked_sub_signed(delta);
    }

    let stamped = raw.strip_suffix(" UTC").unwrap_or(raw);
    if let Ok(d) = DateTime::parse_from_str(stamped, "%m/%d/%Y, %I:%M %p, %z") {
        return Some(d.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%b %d, %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Factory for [`SerpApi`].
///
/// ## Configuration Format
/// ```yaml
/// - id: serpapi
///   type: serpapi
///   options:
///     api_key: "..."     # optional, falls back to SERPAPI_KEY env
///     max_results: 10    # optional
/// ```
pub struct SerpApiFactory;

impl ProviderFactory for SerpApiFactory {
    fn provider_type(&self) -> &'static str {
        "serpapi"
    }

    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn EvidenceProvider>, ConfigError> {
        let provider = SerpApi::from_config(config)?;
        if provider.credential.is_none() {
            tracing::info!(provider = %config.id, "SerpAPI key not set; provider will be skipped");
        }
        Ok(Arc::new(provider))
    }

    fn validate_config(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        validate_base_url(&config.options)
    }

    fn description(&self) -> &'static str {
        "SerpAPI Google News search (API key)"
    }
}
