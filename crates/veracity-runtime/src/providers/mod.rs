//! Evidence provider abstractions.
//!
//! An [`EvidenceProvider`] wraps one external news search API and turns
//! its raw response into [`Article`]s. A [`ProviderAdapter`] puts the
//! configured id, enable flag and timeout around it and is the boundary
//! where every failure becomes a [`ProviderOutcome`] status. Nothing
//! raised by a provider crosses into the aggregator.
//!
//! ## Security
//!
//! Providers that need API keys load them through [`secrets`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use veracity_core::{Article, ProviderOutcome};

mod factory;
pub mod secrets;

#[cfg(any(feature = "google-news", feature = "newsapi", feature = "serpapi"))]
mod http;

#[cfg(feature = "google-news")]
mod google_news;
#[cfg(feature = "newsapi")]
mod newsapi;
#[cfg(feature = "serpapi")]
mod serpapi;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "google-news")]
pub use google_news::{GoogleNewsRss, GoogleNewsRssFactory};
#[cfg(feature = "newsapi")]
pub use newsapi::{NewsApi, NewsApiFactory};
#[cfg(feature = "serpapi")]
pub use serpapi::{SerpApi, SerpApiFactory};

/// Longest description kept on an article.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Errors from evidence providers. Never leave a [`ProviderAdapter`].
#[derive(Error, Debug)]
pub enum ProviderError {
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

/// One external news search source.
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Provider type name for logs.
    fn name(&self) -> &str;

    /// Why this provider cannot be called, e.g. missing credentials.
    ///
    /// A provider with a skip reason reports `Empty` without a network call.
    fn skip_reason(&self) -> Option<String> {
        None
    }

    /// Search for articles matching `query`. Single attempt, no retries.
    ///
    /// `provider_id` on the returned articles is overwritten by the adapter.
    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError>;
}

/// A configured provider: the adapter boundary of the pipeline.
#[derive(Clone)]
pub struct ProviderAdapter {
    id: String,
    enabled: bool,
    timeout: Duration,
    provider: Arc<dyn EvidenceProvider>,
}

impl ProviderAdapter {
    pub fn new(id: impl Into<String>, provider: Arc<dyn EvidenceProvider>, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            timeout,
            provider,
        }
    }

    /// Keep the adapter in order but never call it.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.provider.skip_reason().is_none()
    }

    /// Query the provider under `deadline`. Never fails.
    ///
    /// The effective deadline is the earlier of `deadline` and this
    /// adapter's own timeout. A call still running at the deadline is
    /// dropped (cancelling the request) and reported as `Timeout`.
    pub async fn fetch(&self, query: &str, deadline: Instant) -> ProviderOutcome {
        if !self.enabled {
            tracing::debug!(provider = %self.id, "Provider disabled by configuration");
            return ProviderOutcome::skipped(&self.id, "disabled by configuration");
        }

        if let Some(reason) = self.provider.skip_reason() {
            tracing::debug!(provider = %self.id, reason = %reason, "Provider skipped");
            return ProviderOutcome::skipped(&self.id, reason);
        }

        let started = Instant::now();
        let deadline = deadline.min(started + self.timeout);

        match tokio::time::timeout_at(deadline, self.provider.search(query)).await {
            Ok(Ok(mut articles)) => {
                for article in &mut articles {
                    article.provider_id = self.id.clone();
                }
                tracing::debug!(
                    provider = %self.id,
                    articles = articles.len(),
                    elapsed = ?started.elapsed(),
                    "Provider completed"
                );
                ProviderOutcome::completed(&self.id, articles, started.elapsed())
            }
            Ok(Err(ProviderError::Timeout(after))) => {
                tracing::warn!(provider = %self.id, timeout = ?after, "Provider transport timed out");
                ProviderOutcome::timeout(&self.id, started.elapsed())
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = %self.id, error = %e, "Provider failed");
                ProviderOutcome::error(&self.id, e.to_string(), started.elapsed())
            }
            Err(_) => {
                tracing::warn!(provider = %self.id, elapsed = ?started.elapsed(), "Provider missed deadline");
                ProviderOutcome::timeout(&self.id, started.elapsed())
            }
        }
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .field("enabled", &self.enabled)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Clip a description to [`MAX_DESCRIPTION_CHARS`]; blank becomes `None`.
pub(crate) fn clip_description(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| veracity_core::normalize::truncate_chars(t, MAX_DESCRIPTION_CHARS).to_string())
}
