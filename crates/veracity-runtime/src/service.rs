//! Request-level service: cache, then pipeline, then history.

use std::sync::Arc;

use serde::Serialize;
use veracity_core::AnalysisResult;

use crate::cache::{AnalysisCache, CacheKey};
use crate::history::{HistoryError, HistoryStore};
use crate::orchestrator::{AnalysisError, PipelineOrchestrator};

/// What a caller gets back for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse {
    pub result: AnalysisResult,

    /// Served from the result cache
    pub cached: bool,

    /// Set when the result could not be saved to history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

/// Composes the result cache, the orchestrator and a history store.
pub struct AnalysisService {
    orchestrator: Arc<PipelineOrchestrator>,
    cache: Option<AnalysisCache>,
    history: Arc<dyn HistoryStore>,
}

impl AnalysisService {
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        cache: Option<AnalysisCache>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            history,
        }
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    /// Analyze `text` for `user_id` and record it in their history.
    ///
    /// A history failure never fails the request: the result is returned
    /// with a `persistence_warning` instead.
    pub async fn analyze_for_user(&self, user_id: &str, text: &str) -> Result<ServiceResponse, AnalysisError> {
        let key = CacheKey::new(text);

        let cached = match &self.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        };

        let (result, cached) = match cached {
            Some(result) => {
                tracing::debug!(user = user_id, "Analysis served from cache");
                (result, true)
            }
            None => {
                let result = self.orchestrator.analyze(text).await?;
                if let Some(cache) = &self.cache {
                    cache.insert(key, result.clone()).await;
                }
                (result, false)
            }
        };

        let persistence_warning = match self.history.save(user_id, &result).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "Failed to save analysis history");
                Some(format!("Result not saved to history: {}", e))
            }
        };

        Ok(ServiceResponse {
            result,
            cached,
            persistence_warning,
        })
    }

    /// Most recent analyses for `user_id`.
    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError> {
        self.history.list(user_id, limit).await
    }
}
