//! Evidence aggregator: concurrent fan-out to every configured adapter
//! under one shared deadline, then fan-in through
//! [`veracity_core::corroboration::assemble`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use veracity_core::{
    corroboration, CorroborationSignal, KeywordQueryBuilder, ProviderOutcome, QueryBuilder,
    SearchQuery,
};

use crate::config::{AggregationConfig, ConfigError};
use crate::providers::{ProviderAdapter, ProviderRegistry};

/// Errors from the aggregation branch.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("No evidence providers configured")]
    NoProviders,

    #[error("All {0} provider tasks failed to run")]
    AllProvidersFailed(usize),
}

/// Fans one query out to every adapter and assembles the signal.
#[derive(Clone)]
pub struct EvidenceAggregator {
    adapters: Vec<ProviderAdapter>,
    query_builder: Arc<dyn QueryBuilder>,
    deadline: Duration,
}

impl EvidenceAggregator {
    /// `adapters` in precedence order.
    pub fn new(adapters: Vec<ProviderAdapter>, deadline: Duration) -> Self {
        Self {
            adapters,
            query_builder: Arc::new(KeywordQueryBuilder::new()),
            deadline,
        }
    }

    pub fn with_query_builder(mut self, query_builder: Arc<dyn QueryBuilder>) -> Self {
        self.query_builder = query_builder;
        self
    }

    pub fn from_config(config: &AggregationConfig, registry: &ProviderRegistry) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.build_adapters(&config.providers)?, config.deadline))
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn adapters(&self) -> &[ProviderAdapter] {
        &self.adapters
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn build_query(&self, text: &str) -> SearchQuery {
        self.query_builder.build(text)
    }

    /// Build the query for `text` and gather evidence for it.
    pub async fn aggregate(&self, text: &str) -> Result<CorroborationSignal, AggregationError> {
        self.gather(self.build_query(text)).await
    }

    /// Query every adapter concurrently and assemble the signal.
    ///
    /// Returns within the aggregation deadline. Adapter failures are
    /// recorded in the outcomes; only a run where no adapter task could
    /// complete at all is an error.
    pub async fn gather(&self, query: SearchQuery) -> Result<CorroborationSignal, AggregationError> {
        self.gather_with_cutoff(query, None).await
    }

    /// Like [`gather`](Self::gather), but no adapter runs past `cutoff`.
    ///
    /// Adapters that finished before the cutoff keep their outcomes; only
    /// the ones still running are recorded as `Timeout`.
    pub async fn gather_until(
        &self,
        query: SearchQuery,
        cutoff: Instant,
    ) -> Result<CorroborationSignal, AggregationError> {
        self.gather_with_cutoff(query, Some(cutoff)).await
    }

    async fn gather_with_cutoff(
        &self,
        query: SearchQuery,
        cutoff: Option<Instant>,
    ) -> Result<CorroborationSignal, AggregationError> {
        if self.adapters.is_empty() {
            return Err(AggregationError::NoProviders);
        }

        let started = Instant::now();
        let own = started + self.deadline;
        let deadline = cutoff.map_or(own, |c| c.min(own));

        let handles: Vec<_> = self
            .adapters
            .iter()
            .cloned()
            .map(|adapter| {
                let q = query.query.clone();
                tokio::spawn(async move { adapter.fetch(&q, deadline).await })
            })
            .collect();

        let mut panicked = 0;
        let outcomes: Vec<ProviderOutcome> = futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(&self.adapters)
            .map(|(joined, adapter)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    panicked += 1;
                    tracing::warn!(provider = %adapter.id(), error = %e, "Provider task failed");
                    ProviderOutcome::error(adapter.id(), format!("provider task failed: {}", e), started.elapsed())
                }
            })
            .collect();

        if panicked == outcomes.len() {
            return Err(AggregationError::AllProvidersFailed(panicked));
        }

        Ok(corroboration::assemble(query, outcomes))
    }
}

impl std::fmt::Debug for EvidenceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceAggregator")
            .field("adapters", &self.adapters)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EvidenceProvider, ProviderError};
    use async_trait::async_trait;
    use veracity_core::{Article, CorroborationStatus, ProviderStatus};

    enum Behaviour {
        Articles(Vec<&'static str>),
        Fail,
        Panic,
    }

    struct FakeProvider {
        behaviour: Behaviour,
        delay: Duration,
    }

    #[async_trait]
    impl EvidenceProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn search(&self, _query: &str) -> Result<Vec<Article>, ProviderError> {
            tokio::time::sleep(self.delay).await;
            match &self.behaviour {
                Behaviour::Articles(titles) => Ok(titles
                    .iter()
                    .map(|t| Article {
                        title: t.to_string(),
                        source: "Wire".to_string(),
                        url: format!("https://wire.example/{}", t.len()),
                        published_at: None,
                        description: None,
                        provider_id: String::new(),
                    })
                    .collect()),
                Behaviour::Fail => Err(ProviderError::Api { status: 503, message: "down".to_string() }),
                Behaviour::Panic => panic!("provider bug"),
            }
        }
    }

    fn adapter(id: &str, behaviour: Behaviour, delay_ms: u64) -> ProviderAdapter {
        ProviderAdapter::new(
            id,
            Arc::new(FakeProvider { behaviour, delay: Duration::from_millis(delay_ms) }),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_is_concurrent() {
        let aggregator = EvidenceAggregator::new(
            vec![
                adapter("a", Behaviour::Articles(vec!["alpha story"]), 1_000),
                adapter("b", Behaviour::Articles(vec!["beta story here"]), 1_000),
                adapter("c", Behaviour::Articles(vec!["gamma"]), 1_000),
            ],
            Duration::from_secs(6),
        );

        let started = Instant::now();
        let signal = aggregator.aggregate("short claim text").await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(1_500));
        assert_eq!(signal.status, CorroborationStatus::Found);
        assert_eq!(signal.total_results, 3);
        assert_eq!(signal.query, "short claim text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_keep_configured_order() {
        let aggregator = EvidenceAggregator::new(
            vec![
                adapter("slow", Behaviour::Articles(vec!["Same story"]), 500),
                adapter("fast", Behaviour::Articles(vec!["same story"]), 10),
            ],
            Duration::from_secs(6),
        );

        let signal = aggregator.aggregate("short claim text").await.unwrap();
        let ids: Vec<_> = signal.provider_outcomes.iter().map(|o| o.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast"]);
        assert_eq!(signal.total_results, 1);
        assert_eq!(signal.top_articles[0].provider_id, "slow");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_deadline_bounds_slow_provider() {
        let aggregator = EvidenceAggregator::new(
            vec![
                adapter("ok", Behaviour::Articles(vec![]), 10),
                adapter("stuck", Behaviour::Articles(vec!["late"]), 60_000),
            ],
            Duration::from_secs(2),
        );

        let started = Instant::now();
        let signal = aggregator.aggregate("short claim text").await.unwrap();

        assert!(started.elapsed() <= Duration::from_secs(2));
        assert_eq!(signal.status, CorroborationStatus::Inconclusive);
        assert_eq!(signal.provider_outcomes[1].status, ProviderStatus::Timeout);
    }

    #[tokio::test]
    async fn test_panicking_adapter_recorded_as_error() {
        let aggregator = EvidenceAggregator::new(
            vec![
                adapter("bug", Behaviour::Panic, 0),
                adapter("down", Behaviour::Fail, 0),
                adapter("ok", Behaviour::Articles(vec!["story"]), 0),
            ],
            Duration::from_secs(6),
        );

        let signal = aggregator.aggregate("short claim text").await.unwrap();
        assert_eq!(signal.provider_outcomes[0].status, ProviderStatus::Error);
        assert_eq!(signal.provider_outcomes[1].status, ProviderStatus::Error);
        assert_eq!(signal.status, CorroborationStatus::Found);
    }

    #[tokio::test]
    async fn test_all_tasks_panicking_fails() {
        let aggregator = EvidenceAggregator::new(
            vec![adapter("a", Behaviour::Panic, 0), adapter("b", Behaviour::Panic, 0)],
            Duration::from_secs(6),
        );

        assert!(matches!(
            aggregator.aggregate("short claim text").await,
            Err(AggregationError::AllProvidersFailed(2))
        ));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let aggregator = EvidenceAggregator::new(vec![], Duration::from_secs(6));
        assert!(matches!(
            aggregator.aggregate("short claim text").await,
            Err(AggregationError::NoProviders)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cutoff_keeps_finished_outcomes() {
        let aggregator = EvidenceAggregator::new(
            vec![
                adapter("fast", Behaviour::Articles(vec!["early story"]), 0),
                adapter("slow", Behaviour::Articles(vec!["late story"]), 1_900),
            ],
            Duration::from_secs(2),
        );

        let started = Instant::now();
        let query = aggregator.build_query("short claim text");
        let signal = aggregator
            .gather_until(query, started + Duration::from_millis(1_500))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(1_500));
        assert_eq!(signal.status, CorroborationStatus::Found);
        assert_eq!(signal.total_results, 1);
        assert_eq!(signal.provider_outcomes[0].status, ProviderStatus::Ok);
        assert_eq!(signal.provider_outcomes[1].status, ProviderStatus::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_cutoff_does_not_extend_deadline() {
        let aggregator = EvidenceAggregator::new(
            vec![adapter("stuck", Behaviour::Articles(vec!["late"]), 60_000)],
            Duration::from_secs(2),
        );

        let started = Instant::now();
        let query = aggregator.build_query("short claim text");
        let signal = aggregator
            .gather_until(query, started + Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(signal.provider_outcomes[0].status, ProviderStatus::Timeout);
    }
}
