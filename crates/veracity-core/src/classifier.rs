//! The primary text classifier, consumed as a black box.
//!
//! The pipeline never trains or inspects the model. It only needs a
//! label and a probability pair for one piece of text.

use thiserror::Error;

use crate::types::ClassifierVerdict;

/// Errors from the classifier collaborator. Always fatal to a request.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Invalid probability: {0} (expected a finite value in [0, 1])")]
    InvalidProbability(f64),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classification failed: {0}")]
    Failed(String),
}

/// Binary fake/real text classifier.
///
/// Assumed local and fast; the orchestrator calls it without a deadline.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError>;

    /// Name for logs.
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Classifier that returns a verdict computed elsewhere.
///
/// Used when the model runs out of process and its output is handed in
/// (CLI flags, a queue message), and in tests.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    verdict: ClassifierVerdict,
}

impl StaticClassifier {
    pub fn new(verdict: ClassifierVerdict) -> Self {
        Self { verdict }
    }
}

impl Classifier for StaticClassifier {
    fn classify(&self, _text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        Ok(self.verdict)
    }

    fn name(&self) -> &str {
        "static"
    }
}
