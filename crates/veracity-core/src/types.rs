//! Core types for evidence consensus.
//!
//! Every value here is built once per analysis request and never mutated
//! afterwards. Only [`AnalysisResult`] outlives the request, when a caller
//! hands it to a history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::classifier::ClassifierError;

/// Binary label for a piece of news text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Real,
    Fake,
}

impl Label {
    /// The other label.
    pub fn opposite(self) -> Self {
        match self {
            Label::Real => Label::Fake,
            Label::Fake => Label::Real,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Real => "real",
            Label::Fake => "fake",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Label`] from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown label '{0}': expected 'real' or 'fake'")]
pub struct ParseLabelError(pub String);

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "real" => Ok(Label::Real),
            "fake" => Ok(Label::Fake),
            other => Err(ParseLabelError(other.to_string())),
        }
    }
}

/// Output of the primary text classifier.
///
/// `probability_fake` is always `1 - probability_real`; the constructors
/// are the only way to build one, so the pair cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClassifierVerdict")]
pub struct ClassifierVerdict {
    label: Label,
    probability_real: f64,
    probability_fake: f64,
}

#[derive(Deserialize)]
struct RawClassifierVerdict {
    label: Label,
    probability_real: f64,
}

impl TryFrom<RawClassifierVerdict> for ClassifierVerdict {
    type Error = ClassifierError;

    fn try_from(raw: RawClassifierVerdict) -> Result<Self, Self::Error> {
        Self::new(raw.label, raw.probability_real)
    }
}

impl ClassifierVerdict {
    /// Build a verdict from the model's label and its probability of `Real`.
    pub fn new(label: Label, probability_real: f64) -> Result<Self, ClassifierError> {
        if !probability_real.is_finite() || !(0.0..=1.0).contains(&probability_real) {
            return Err(ClassifierError::InvalidProbability(probability_real));
        }

        Ok(Self {
            label,
            probability_real,
            probability_fake: 1.0 - probability_real,
        })
    }

    /// Build a verdict whose label is the more probable class.
    ///
    /// An exact 0.5 resolves to `Real`.
    pub fn from_probability_real(probability_real: f64) -> Result<Self, ClassifierError> {
        let label = if probability_real >= 0.5 {
            Label::Real
        } else {
            Label::Fake
        };
        Self::new(label, probability_real)
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn probability_real(&self) -> f64 {
        self.probability_real
    }

    pub fn probability_fake(&self) -> f64 {
        self.probability_fake
    }

    /// Probability the classifier assigned to `label`.
    pub fn probability_of(&self, label: Label) -> f64 {
        match label {
            Label::Real => self.probability_real,
            Label::Fake => self.probability_fake,
        }
    }
}

/// A news article normalized from one evidence provider's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,

    /// Publisher name (e.g. "Reuters")
    pub source: String,

    pub url: String,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: Option<String>,

    /// Id of the provider that produced this article
    pub provider_id: String,
}

/// How one provider call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Returned at least one article
    Ok,
    /// Did not finish before the deadline
    Timeout,
    /// Transport, rate-limit or decode failure
    Error,
    /// Completed with nothing found, or skipped
    Empty,
}

impl ProviderStatus {
    /// True for `Error` and `Timeout`: we failed to check.
    pub fn is_failure(&self) -> bool {
        matches!(self, ProviderStatus::Error | ProviderStatus::Timeout)
    }
}

/// Result of one provider call within one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider_id: String,
    pub status: ProviderStatus,
    pub articles: Vec<Article>,
    #[serde(default)]
    pub error_detail: Option<String>,
    pub elapsed_ms: u64,
}

impl ProviderOutcome {
    /// A completed call. An empty article list becomes `Empty`.
    pub fn completed(provider_id: impl Into<String>, articles: Vec<Article>, elapsed: Duration) -> Self {
        let status = if articles.is_empty() {
            ProviderStatus::Empty
        } else {
            ProviderStatus::Ok
        };

        Self {
            provider_id: provider_id.into(),
            status,
            articles,
            error_detail: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// A provider that was not called at all (disabled, missing credentials).
    pub fn skipped(provider_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: ProviderStatus::Empty,
            articles: Vec::new(),
            error_detail: Some(reason.into()),
            elapsed_ms: 0,
        }
    }

    pub fn timeout(provider_id: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: ProviderStatus::Timeout,
            articles: Vec::new(),
            error_detail: Some(format!("deadline exceeded after {}ms", elapsed.as_millis())),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn error(provider_id: impl Into<String>, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: ProviderStatus::Error,
            articles: Vec::new(),
            error_detail: Some(detail.into()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Whether any source discusses the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorroborationStatus {
    /// At least one article survived deduplication
    Found,
    /// Every provider completed and found nothing
    NotFound,
    /// Nothing found, but at least one provider failed to check
    Inconclusive,
}

/// Evidence gathered across all providers for one request.
///
/// Built by [`crate::corroboration::assemble`], which keeps
/// `status == Found` iff `total_results > 0` and
/// `top_articles.len() <= total_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroborationSignal {
    pub status: CorroborationStatus,

    /// Distinct articles after deduplication
    pub total_results: usize,

    /// Most recent articles, at most [`crate::corroboration::TOP_ARTICLES`]
    pub top_articles: Vec<Article>,

    /// One outcome per provider, in configured order
    pub provider_outcomes: Vec<ProviderOutcome>,

    /// Search query sent to every provider
    pub query: String,

    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Opinion of the auxiliary reasoning service.
///
/// `available == false` is the normal state when the service is disabled,
/// slow, or broken. It is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCheckOpinion {
    pub available: bool,

    /// `None` when unavailable or when the service answered "uncertain"
    pub label: Option<Label>,

    pub confidence: Option<f64>,

    #[serde(default)]
    pub reasoning: Option<String>,
}

impl CrossCheckOpinion {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            label: None,
            confidence: None,
            reasoning: None,
        }
    }

    /// An answer from the service. Confidence is clamped to `[0, 1]`.
    pub fn answered(label: Option<Label>, confidence: f64, reasoning: Option<String>) -> Self {
        Self {
            available: true,
            label,
            confidence: Some(confidence.clamp(0.0, 1.0)),
            reasoning,
        }
    }

    /// The label, only if the service is available and committed to one.
    pub fn committed_label(&self) -> Option<Label> {
        if self.available {
            self.label
        } else {
            None
        }
    }
}

/// Which merge rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// Confident cross-check disagreed with the classifier
    CrossCheckDisagreement,
    /// Fake verdict with related coverage found
    FakeWithCoverage,
    /// Low-confidence Real with no corroboration at all
    UncorroboratedUncertainReal,
    /// No conflicting or informative signal
    Baseline,
}

/// Final explainable verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Always the classifier's label
    pub label: Label,

    /// In `[0, 1]`
    pub confidence: f64,

    pub rationale: String,

    pub rule: ResolutionRule,
}

/// Everything computed for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// First characters of the analyzed text
    pub text_excerpt: String,

    pub classifier: ClassifierVerdict,

    pub corroboration: CorroborationSignal,

    pub cross_check: CrossCheckOpinion,

    pub verdict: Verdict,

    pub analyzed_at: DateTime<Utc>,

    /// Wall time spent in the pipeline
    pub elapsed_ms: u64,
}
