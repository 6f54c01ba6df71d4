//! Corroboration signal assembly.
//!
//! Turns the per-provider outcomes of one request into a single signal:
//! 1. Merge articles in provider order
//! 2. Drop duplicates (first occurrence wins)
//! 3. Rank by recency
//! 4. Keep the top [`TOP_ARTICLES`] and derive the status
//!
//! Pure and deterministic; all I/O happened before this point.

use crate::article::{dedup, rank_by_recency};
use crate::query::SearchQuery;
use crate::types::{CorroborationSignal, CorroborationStatus, ProviderOutcome};

/// Maximum articles carried in a signal.
pub const TOP_ARTICLES: usize = 5;

/// Build the corroboration signal for one request.
///
/// `outcomes` must be in configured provider order.
pub fn assemble(query: SearchQuery, outcomes: Vec<ProviderOutcome>) -> CorroborationSignal {
    let mut articles = dedup(outcomes.iter().flat_map(|o| o.articles.iter().cloned()));
    rank_by_recency(&mut articles);

    let total_results = articles.len();
    let status = status_for(total_results, &outcomes);
    articles.truncate(TOP_ARTICLES);

    tracing::debug!(
        status = ?status,
        total_results,
        providers = outcomes.len(),
        "Corroboration assembled"
    );

    CorroborationSignal {
        status,
        total_results,
        top_articles: articles,
        provider_outcomes: outcomes,
        query: query.query,
        keywords: query.keywords,
    }
}

fn status_for(total_results: usize, outcomes: &[ProviderOutcome]) -> CorroborationStatus {
    if total_results > 0 {
        CorroborationStatus::Found
    } else if outcomes.iter().any(|o| o.status.is_failure()) {
        CorroborationStatus::Inconclusive
    } else {
        CorroborationStatus::NotFound
    }
}
