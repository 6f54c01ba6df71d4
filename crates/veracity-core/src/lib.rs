//! # veracity-core
//!
//! Deterministic evidence consensus for news verdicts.
//!
//! This crate answers one question: given a classifier verdict, whatever
//! news coverage the providers turned up, and an optional independent
//! cross-check, what is the final label, how confident are we, and why?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same inputs always produce the same verdict
//! 2. **No I/O**: Network fan-out lives in `veracity-runtime`
//! 3. **Label-preserving**: The resolver never overrides the classifier's label
//! 4. **Explainable**: Every verdict carries a one-line rationale and the rule that fired
//!
//! ## Example
//!
//! ```rust,ignore
//! use veracity_core::{corroboration, ConsensusResolver, ClassifierVerdict, CrossCheckOpinion,
//!     KeywordQueryBuilder, Label, QueryBuilder};
//!
//! let classifier = ClassifierVerdict::new(Label::Fake, 0.13)?;
//! let query = KeywordQueryBuilder::new().build(text);
//! let signal = corroboration::assemble(query, outcomes);
//!
//! let verdict = ConsensusResolver::new().resolve(
//!     &classifier,
//!     &signal,
//!     &CrossCheckOpinion::unavailable(),
//! );
//! println!("{} ({:.2}): {}", verdict.label, verdict.confidence, verdict.rationale);
//! ```

pub mod article;
pub mod classifier;
pub mod corroboration;
pub mod normalize;
pub mod query;
pub mod resolver;
pub mod types;

// Re-export main types at crate root
pub use article::{dedup, rank_by_recency, ArticleKey};
pub use classifier::{Classifier, ClassifierError, StaticClassifier};
pub use corroboration::TOP_ARTICLES;
pub use normalize::normalize_text;
pub use query::{KeywordQueryBuilder, QueryBuilder, SearchQuery};
pub use resolver::ConsensusResolver;
pub use types::{
    AnalysisResult, Article, ClassifierVerdict, CorroborationSignal, CorroborationStatus,
    CrossCheckOpinion, Label, ParseLabelError, ProviderOutcome, ProviderStatus, ResolutionRule,
    Verdict,
};
