//! # veracity-runtime
//!
//! Concurrent evidence gathering for Veracity.
//!
//! `veracity-core` decides; this crate goes out and asks. It fans a query
//! out to news search providers and an optional reasoning service, bounds
//! every call by a deadline, and hands whatever came back to the core
//! resolver.
//!
//! ## Failure model
//!
//! Provider and cross-check failures never surface as errors. They are
//! recorded as `ProviderOutcome` statuses or an unavailable
//! `CrossCheckOpinion`, and the verdict is computed from what remains.
//! Only invalid input, a classifier failure, or an aggregation run with
//! nothing to run fail a request.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use veracity_core::{ClassifierVerdict, Label, StaticClassifier};
//! use veracity_runtime::{PipelineConfig, PipelineOrchestrator, ProviderRegistry};
//!
//! let config = PipelineConfig::from_file("veracity.yaml")?;
//! let classifier = Arc::new(StaticClassifier::new(ClassifierVerdict::new(Label::Fake, 0.13)?));
//! let orchestrator =
//!     PipelineOrchestrator::from_config(&config, classifier, &ProviderRegistry::with_defaults())?;
//!
//! let result = orchestrator.analyze("Scientists confirm the moon is made of cheese.").await?;
//! println!("{} ({:.2}): {}", result.verdict.label, result.verdict.confidence, result.verdict.rationale);
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod crosscheck;
pub mod history;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod service;

pub use aggregator::{AggregationError, EvidenceAggregator};
pub use cache::{AnalysisCache, CacheKey};
pub use config::{
    AggregationConfig, CacheConfig, ConfigError, CrossCheckConfig, PipelineConfig, ProviderConfig,
};
pub use crosscheck::{
    llm_provider_from_config, parse_opinion, ChatMessage, CompletionConfig, CompletionResponse,
    CrossCheckAdapter, LlmError, LlmProvider, TokenUsage,
};
pub use history::{HistoryError, HistoryStore, InMemoryHistoryStore};
pub use orchestrator::{AnalysisError, PipelineOrchestrator, PipelineOrchestratorBuilder};
pub use providers::{
    ApiCredential, CredentialSource, EvidenceProvider, ProviderAdapter, ProviderError,
    ProviderFactory, ProviderRegistry,
};
pub use service::{AnalysisService, ServiceResponse};
