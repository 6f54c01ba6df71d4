//! Pipeline orchestrator.
//!
//! Sequencing for one request:
//! 1. Validate the text (before any network call)
//! 2. Classify it (local, synchronous)
//! 3. Fan-out: aggregation and cross-check concurrently via `tokio::join!`
//! 4. Fan-in: the deterministic [`ConsensusResolver`]
//!
//! Wall time is bounded by `max(aggregation deadline, cross-check
//! timeout) + grace`, never by their sum. The orchestrator never caches
//! and never persists.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;
use veracity_core::normalize::truncate_chars;
use veracity_core::{
    AnalysisResult, Classifier, ClassifierError, ConsensusResolver, CrossCheckOpinion,
};

use crate::aggregator::{AggregationError, EvidenceAggregator};
use crate::config::{ConfigError, PipelineConfig};
use crate::crosscheck::CrossCheckAdapter;
use crate::providers::ProviderRegistry;

/// Characters of input kept on the result.
pub const TEXT_EXCERPT_CHARS: usize = 500;

/// Errors surfaced to the caller of [`PipelineOrchestrator::analyze`].
///
/// Provider and cross-check failures are absent on purpose: they end up in
/// the result as statuses.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Text too short: {length} characters, minimum is {minimum}")]
    InvalidInput { length: usize, minimum: usize },

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
}

/// Runs the evidence consensus pipeline for one text at a time.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct PipelineOrchestrator {
    classifier: Arc<dyn Classifier>,
    aggregator: EvidenceAggregator,
    cross_check: CrossCheckAdapter,
    resolver: ConsensusResolver,
    min_text_length: usize,
    deadline_grace: Duration,
}

impl PipelineOrchestrator {
    pub fn builder() -> PipelineOrchestratorBuilder {
        PipelineOrchestratorBuilder::new()
    }

    /// Wire a pipeline from configuration.
    pub fn from_config(
        config: &PipelineConfig,
        classifier: Arc<dyn Classifier>,
        registry: &ProviderRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Self::builder()
            .classifier(classifier)
            .aggregator(EvidenceAggregator::from_config(&config.aggregation, registry)?)
            .cross_check(CrossCheckAdapter::from_config(&config.cross_check)?)
            .min_text_length(config.min_text_length)
            .deadline_grace(config.deadline_grace)
            .build()
    }

    pub fn aggregator(&self) -> &EvidenceAggregator {
        &self.aggregator
    }

    pub fn cross_check(&self) -> &CrossCheckAdapter {
        &self.cross_check
    }

    /// Upper bound on the wall time of [`analyze`](Self::analyze).
    pub fn overall_deadline(&self) -> Duration {
        self.aggregator.deadline().max(self.cross_check.timeout()) + self.deadline_grace
    }

    /// Analyze one piece of text.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let text = text.trim();

        let length = text.chars().count();
        if length < self.min_text_length {
            return Err(AnalysisError::InvalidInput {
                length,
                minimum: self.min_text_length,
            });
        }

        let classifier = self.classifier.classify(text)?;
        tracing::debug!(
            classifier = self.classifier.name(),
            label = %classifier.label(),
            probability_real = classifier.probability_real(),
            "Classified"
        );

        let query = self.aggregator.build_query(text);
        let deadline = started + self.overall_deadline();

        // Fan-out: both branches in parallel, neither runs past the deadline.
        // Aggregation cuts its own adapters so finished outcomes survive.
        let (corroboration, cross_check) = tokio::join!(
            self.aggregator.gather_until(query, deadline),
            tokio::time::timeout_at(deadline, self.cross_check.check(text, deadline)),
        );
        let corroboration = corroboration?;

        let cross_check = cross_check.unwrap_or_else(|_| {
            tracing::warn!(elapsed = ?started.elapsed(), "Cross-check missed the overall deadline");
            CrossCheckOpinion::unavailable()
        });

        // Fan-in: deterministic resolution
        let verdict = self.resolver.resolve(&classifier, &corroboration, &cross_check);
        let elapsed = started.elapsed();

        tracing::info!(
            label = %verdict.label,
            confidence = verdict.confidence,
            rule = ?verdict.rule,
            corroboration = ?corroboration.status,
            cross_check = cross_check.available,
            elapsed = ?elapsed,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            text_excerpt: truncate_chars(text, TEXT_EXCERPT_CHARS).to_string(),
            classifier,
            corroboration,
            cross_check,
            verdict,
            analyzed_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("classifier", &self.classifier.name())
            .field("aggregator", &self.aggregator)
            .field("cross_check", &self.cross_check)
            .field("min_text_length", &self.min_text_length)
            .field("deadline_grace", &self.deadline_grace)
            .finish()
    }
}

/// Builder for [`PipelineOrchestrator`].
pub struct PipelineOrchestratorBuilder {
    classifier: Option<Arc<dyn Classifier>>,
    aggregator: Option<EvidenceAggregator>,
    cross_check: CrossCheckAdapter,
    min_text_length: usize,
    deadline_grace: Duration,
}

impl PipelineOrchestratorBuilder {
    pub fn new() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            classifier: None,
            aggregator: None,
            cross_check: CrossCheckAdapter::disabled(),
            min_text_length: defaults.min_text_length,
            deadline_grace: defaults.deadline_grace,
        }
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn aggregator(mut self, aggregator: EvidenceAggregator) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Defaults to disabled.
    pub fn cross_check(mut self, cross_check: CrossCheckAdapter) -> Self {
        self.cross_check = cross_check;
        self
    }

    pub fn min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    pub fn deadline_grace(mut self, grace: Duration) -> Self {
        self.deadline_grace = grace;
        self
    }

    pub fn build(self) -> Result<PipelineOrchestrator, ConfigError> {
        let classifier = self
            .classifier
            .ok_or_else(|| ConfigError::Invalid("a classifier is required".to_string()))?;
        let aggregator = self
            .aggregator
            .ok_or_else(|| ConfigError::Invalid("an evidence aggregator is required".to_string()))?;

        Ok(PipelineOrchestrator {
            classifier,
            aggregator,
            cross_check: self.cross_check,
            resolver: ConsensusResolver::new(),
            min_text_length: self.min_text_length.max(1),
            deadline_grace: self.deadline_grace,
        })
    }
}

impl Default for PipelineOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosscheck::{ChatMessage, CompletionConfig, CompletionResponse, LlmError, LlmProvider, TokenUsage};
    use crate::providers::{EvidenceProvider, ProviderAdapter, ProviderError};
    use async_trait::async_trait;
    use veracity_core::{
        Article, ClassifierVerdict, CorroborationStatus, Label, ResolutionRule, StaticClassifier,
    };

    struct SleepyProvider {
        delay: Duration,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl EvidenceProvider for SleepyProvider {
        fn name(&self) -> &str {
            "sleepy"
        }

        async fn search(&self, _query: &str) -> Result<Vec<Article>, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(self
                .titles
                .iter()
                .map(|t| Article {
                    title: t.to_string(),
                    source: "Wire".to_string(),
                    url: format!("https://wire.example/{}", t.replace(' ', "-")),
                    published_at: None,
                    description: None,
                    provider_id: String::new(),
                })
                .collect())
        }
    }

    struct SleepyLlm {
        delay: Duration,
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for SleepyLlm {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse {
                content: self.reply.to_string(),
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "sleepy-llm"
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn classify(&self, _text: &str) -> Result<ClassifierVerdict, ClassifierError> {
            Err(ClassifierError::Unavailable("model not loaded".to_string()))
        }
    }

    /// Blocks the calling thread, like a model running inline.
    struct SlowClassifier(Duration);

    impl Classifier for SlowClassifier {
        fn classify(&self, _text: &str) -> Result<ClassifierVerdict, ClassifierError> {
            std::thread::sleep(self.0);
            ClassifierVerdict::new(Label::Fake, 0.2)
        }
    }

    fn classifier(label: Label, p_real: f64) -> Arc<dyn Classifier> {
        Arc::new(StaticClassifier::new(ClassifierVerdict::new(label, p_real).unwrap()))
    }

    fn aggregator(delay_ms: u64, titles: Vec<&'static str>, deadline: Duration) -> EvidenceAggregator {
        EvidenceAggregator::new(
            vec![ProviderAdapter::new(
                "wire",
                Arc::new(SleepyProvider { delay: Duration::from_millis(delay_ms), titles }),
                Duration::from_secs(30),
            )],
            deadline,
        )
    }

    fn cross_check(delay_ms: u64, reply: &'static str, timeout: Duration) -> CrossCheckAdapter {
        CrossCheckAdapter::new(
            Arc::new(SleepyLlm { delay: Duration::from_millis(delay_ms), reply }),
            CompletionConfig { timeout, ..CompletionConfig::default() },
        )
    }

    #[tokio::test]
    async fn test_short_text_rejected_before_classifying() {
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(Arc::new(BrokenClassifier))
            .aggregator(aggregator(0, vec![], Duration::from_secs(1)))
            .build()
            .unwrap();

        match orchestrator.analyze("   too short ").await {
            Err(AnalysisError::InvalidInput { length, minimum }) => {
                assert_eq!(length, 9);
                assert_eq!(minimum, 10);
            }
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        assert!(matches!(
            orchestrator.analyze("").await,
            Err(AnalysisError::InvalidInput { length: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_classifier_failure_is_fatal() {
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(Arc::new(BrokenClassifier))
            .aggregator(aggregator(0, vec![], Duration::from_secs(1)))
            .build()
            .unwrap();

        assert!(matches!(
            orchestrator.analyze("A sufficiently long claim.").await,
            Err(AnalysisError::Classifier(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_branches_run_concurrently() {
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(classifier(Label::Fake, 0.13))
            .aggregator(aggregator(3_000, vec!["Claim debunked"], Duration::from_secs(6)))
            .cross_check(cross_check(3_000, "Classification: FAKE\nConfidence: 90%", Duration::from_secs(8)))
            .build()
            .unwrap();

        let started = Instant::now();
        let result = orchestrator.analyze("Celebrity secretly replaced by a clone.").await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.verdict.label, Label::Fake);
        assert_eq!(result.verdict.rule, ResolutionRule::FakeWithCoverage);
        assert!(result.verdict.rationale.ends_with("Independent cross-check agrees."));
        assert!(result.cross_check.available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_branches_cut_at_overall_deadline() {
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(classifier(Label::Real, 0.9))
            .aggregator(aggregator(60_000, vec!["late"], Duration::from_secs(2)))
            .cross_check(cross_check(60_000, "Classification: FAKE", Duration::from_secs(3)))
            .build()
            .unwrap();

        let started = Instant::now();
        let result = orchestrator.analyze("A claim nobody answers in time.").await.unwrap();

        assert!(started.elapsed() <= orchestrator.overall_deadline());
        assert_eq!(orchestrator.overall_deadline(), Duration::from_millis(3_250));
        assert_eq!(result.corroboration.status, CorroborationStatus::Inconclusive);
        assert!(!result.cross_check.available);
        assert!((result.verdict.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_slow_classifier_keeps_finished_providers() {
        let adapter = |id: &str, delay_ms: u64, titles: Vec<&'static str>| {
            ProviderAdapter::new(
                id,
                Arc::new(SleepyProvider { delay: Duration::from_millis(delay_ms), titles }),
                Duration::from_secs(30),
            )
        };
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(Arc::new(SlowClassifier(Duration::from_millis(400))))
            .aggregator(EvidenceAggregator::new(
                vec![adapter("fast", 0, vec!["Hoax traced to satire site"]), adapter("slow", 900, vec!["late"])],
                Duration::from_secs(1),
            ))
            .deadline_grace(Duration::from_millis(100))
            .build()
            .unwrap();

        let started = Instant::now();
        let result = orchestrator.analyze("Celebrity secretly replaced by a clone.").await.unwrap();
        let signal = &result.corroboration;

        assert!(started.elapsed() < Duration::from_millis(1_300));
        assert_eq!(signal.status, CorroborationStatus::Found);
        assert_eq!(signal.total_results, 1);
        assert_eq!(signal.provider_outcomes[0].status, veracity_core::ProviderStatus::Ok);
        assert_eq!(signal.provider_outcomes[1].status, veracity_core::ProviderStatus::Timeout);
    }

    #[tokio::test]
    async fn test_result_carries_excerpt() {
        let long_text = "word ".repeat(200);
        let orchestrator = PipelineOrchestrator::builder()
            .classifier(classifier(Label::Real, 0.8))
            .aggregator(aggregator(0, vec![], Duration::from_secs(1)))
            .build()
            .unwrap();

        let result = orchestrator.analyze(&long_text).await.unwrap();
        assert_eq!(result.text_excerpt.chars().count(), TEXT_EXCERPT_CHARS);
        assert_eq!(result.corroboration.status, CorroborationStatus::NotFound);
        assert!(!result.cross_check.available);
    }

    #[test]
    fn test_builder_requires_parts() {
        assert!(PipelineOrchestrator::builder().build().is_err());
        assert!(PipelineOrchestrator::builder()
            .classifier(classifier(Label::Real, 0.8))
            .build()
            .is_err());
    }

    #[test]
    fn test_from_config_with_empty_registry_fails() {
        let result = PipelineOrchestrator::from_config(
            &PipelineConfig::default(),
            classifier(Label::Real, 0.8),
            &ProviderRegistry::new(),
        );
        assert!(matches!(result, Err(ConfigError::UnknownProviderType { .. })));
    }
}
