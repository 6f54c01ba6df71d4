//! Search query extraction.
//!
//! Providers get one query derived from the submitted text. The heuristic
//! sits behind [`QueryBuilder`] so deployments can swap it; whatever
//! builder is used must be deterministic for a given input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::normalize::{collapse_whitespace, truncate_chars};

lazy_static! {
    /// Words of three or more ASCII letters
    static ref WORD_PATTERN: Regex = Regex::new(r"\b[A-Za-z]{3,}\b").unwrap();

    static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
        "is", "are", "was", "were", "been", "be", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should", "may", "might", "can", "said", "says", "that",
        "this", "they", "their", "them", "there", "these", "those", "what", "which", "when",
        "where", "who", "whom", "how", "why", "just", "only", "even", "also", "very", "most",
        "some", "many", "much", "more", "other", "than", "then", "now", "here", "such", "like",
        "into", "over", "after", "before", "between", "under", "again", "about", "being",
        "once", "during", "each", "because", "through", "while", "news", "breaking", "report",
        "according", "announced", "claims", "article", "story", "sources", "officials",
        "people", "percent", "years",
    ]
    .into_iter()
    .collect();
}

/// Query sent to every evidence provider for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub keywords: Vec<String>,
}

/// Derives a provider search query from free text.
pub trait QueryBuilder: Send + Sync {
    fn build(&self, text: &str) -> SearchQuery;
}

/// Default builder: short texts are searched verbatim, long ones are
/// reduced to proper nouns and salient words.
#[derive(Debug, Clone)]
pub struct KeywordQueryBuilder {
    /// Texts up to this many characters are used as the query directly
    pub max_direct_chars: usize,

    /// Prefix length used when no keywords survive filtering
    pub fallback_chars: usize,

    pub max_proper_nouns: usize,
    pub max_other_words: usize,
    pub max_keywords: usize,

    /// Keywords placed in the query itself
    pub max_query_terms: usize,
}

impl Default for KeywordQueryBuilder {
    fn default() -> Self {
        Self {
            max_direct_chars: 150,
            fallback_chars: 100,
            max_proper_nouns: 4,
            max_other_words: 3,
            max_keywords: 6,
            max_query_terms: 5,
        }
    }
}

impl KeywordQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proper nouns first, then other content words, case-insensitively unique.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect();

        let proper_nouns = words
            .iter()
            .filter(|w| starts_upper(w) && !is_stop_word(w))
            .take(self.max_proper_nouns)
            .map(|w| w.to_string());

        let other_words = words
            .iter()
            .filter(|w| !starts_upper(w) && !is_stop_word(w))
            .take(self.max_other_words)
            .map(|w| w.to_lowercase());

        let mut seen = HashSet::new();
        proper_nouns
            .chain(other_words)
            .filter(|k| seen.insert(k.to_lowercase()))
            .take(self.max_keywords)
            .collect()
    }
}

impl QueryBuilder for KeywordQueryBuilder {
    fn build(&self, text: &str) -> SearchQuery {
        let clean = collapse_whitespace(text);
        let keywords = self.extract_keywords(&clean);

        let query = if clean.chars().count() <= self.max_direct_chars {
            clean
        } else if keywords.is_empty() {
            truncate_chars(&clean, self.fallback_chars).trim().to_string()
        } else {
            keywords
                .iter()
                .take(self.max_query_terms)
                .map(|k| {
                    if starts_upper(k) {
                        format!("\"{}\"", k)
                    } else {
                        k.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        SearchQuery { query, keywords }
    }
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word.to_lowercase().as_str())
}
