//! Short-lived result cache.
//!
//! Repeated submissions of the same text within the TTL skip the provider
//! fan-out. Used by [`crate::service::AnalysisService`]; the orchestrator
//! itself never caches.

use moka::future::Cache;
use std::time::Duration;
use veracity_core::{normalize_text, AnalysisResult};

use crate::config::CacheConfig;

/// Cache key: the text trimmed, lower-cased and whitespace-collapsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(text: &str) -> Self {
        Self(normalize_text(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Analysis result cache using moka.
///
/// Concurrent misses for the same key are not coalesced; each runs the
/// pipeline and the last insert wins.
#[derive(Clone)]
pub struct AnalysisCache {
    cache: Cache<CacheKey, AnalysisResult>,
}

impl AnalysisCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_entries, config.ttl))
    }

    pub async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, result: AnalysisResult) {
        self.cache.insert(key, result).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::new(config.max_entries, config.ttl)
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
