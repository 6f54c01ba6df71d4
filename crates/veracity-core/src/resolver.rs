//! Consensus Resolver: merges three independent signals into one verdict.
//!
//! Rules are evaluated in order; the first that applies wins:
//! 1. Confident cross-check disagrees → keep label, confidence × 0.8
//! 2. Coverage found for a Fake verdict → keep label and confidence
//! 3. No coverage for an uncertain Real → confidence − 0.15
//! 4. Otherwise → classifier confidence, plain corroboration summary
//!
//! The label is always the classifier's. Source search is noisy and
//! informs confidence and rationale only.
//!
//! These constants are the policy. They are not configuration.

use crate::types::{
    ClassifierVerdict, CorroborationSignal, CorroborationStatus, CrossCheckOpinion, Label,
    ResolutionRule, Verdict,
};

/// Minimum cross-check confidence for its disagreement to count.
pub const DISAGREEMENT_THRESHOLD: f64 = 0.75;

/// Multiplier applied to the classifier confidence on disagreement.
pub const DISAGREEMENT_FACTOR: f64 = 0.8;

/// Subtracted when an uncertain Real claim has no coverage at all.
pub const UNCORROBORATED_PENALTY: f64 = 0.15;

/// Real verdicts below this probability count as uncertain.
pub const UNCERTAIN_REAL_THRESHOLD: f64 = 0.6;

/// The Consensus Resolver. Pure, total and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusResolver;

impl ConsensusResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the final verdict.
    pub fn resolve(
        &self,
        classifier: &ClassifierVerdict,
        corroboration: &CorroborationSignal,
        cross_check: &CrossCheckOpinion,
    ) -> Verdict {
        let label = classifier.label();
        let base = classifier.probability_of(label);

        let (confidence, rationale, rule) = if disagrees(label, cross_check) {
            (
                base * DISAGREEMENT_FACTOR,
                "Independent cross-check disagrees; confidence reduced.".to_string(),
                ResolutionRule::CrossCheckDisagreement,
            )
        } else if corroboration.status == CorroborationStatus::Found && label == Label::Fake {
            (
                base,
                with_agreement(
                    format!(
                        "Found {} related {}; coverage may be debunking the claim, so the Fake verdict stands.",
                        corroboration.total_results,
                        plural(corroboration.total_results, "article", "articles"),
                    ),
                    label,
                    cross_check,
                ),
                ResolutionRule::FakeWithCoverage,
            )
        } else if corroboration.status == CorroborationStatus::NotFound
            && label == Label::Real
            && classifier.probability_real() < UNCERTAIN_REAL_THRESHOLD
        {
            (
                base - UNCORROBORATED_PENALTY,
                "No supporting sources found for an uncertain claim.".to_string(),
                ResolutionRule::UncorroboratedUncertainReal,
            )
        } else {
            (
                base,
                with_agreement(summarize(corroboration), label, cross_check),
                ResolutionRule::Baseline,
            )
        };

        Verdict {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            rationale,
            rule,
        }
    }
}

fn disagrees(label: Label, cross_check: &CrossCheckOpinion) -> bool {
    match (cross_check.committed_label(), cross_check.confidence) {
        (Some(other), Some(confidence)) => other != label && confidence >= DISAGREEMENT_THRESHOLD,
        _ => false,
    }
}

/// Plain corroboration summary for the baseline rule.
fn summarize(corroboration: &CorroborationSignal) -> String {
    match corroboration.status {
        CorroborationStatus::Found => format!(
            "Confirmed by {} {}.",
            corroboration.total_results,
            plural(corroboration.total_results, "source", "sources"),
        ),
        CorroborationStatus::NotFound => "No related coverage found.".to_string(),
        CorroborationStatus::Inconclusive => "Source check inconclusive.".to_string(),
    }
}

fn with_agreement(rationale: String, label: Label, cross_check: &CrossCheckOpinion) -> String {
    if cross_check.committed_label() == Some(label) {
        format!("{} Independent cross-check agrees.", rationale)
    } else {
        rationale
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
