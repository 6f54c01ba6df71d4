//! Article identity, deduplication and ranking.
//!
//! Two articles are the same story when their normalized titles (first
//! 80 characters) and normalized sources match. Normalization is
//! case-insensitive and ignores punctuation.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::normalize::{strip_punctuation, truncate_chars};
use crate::types::Article;

/// Number of normalized title characters that take part in identity.
pub const TITLE_KEY_CHARS: usize = 80;

/// Deduplication identity of an article.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleKey {
    title: String,
    source: String,
}

impl ArticleKey {
    pub fn of(article: &Article) -> Self {
        let title = strip_punctuation(&article.title);
        Self {
            title: truncate_chars(&title, TITLE_KEY_CHARS).trim_end().to_string(),
            source: strip_punctuation(&article.source),
        }
    }
}

/// Drop duplicate articles, keeping the first occurrence.
///
/// Input order decides which copy survives, so callers must feed articles
/// in configured provider order.
pub fn dedup<I>(articles: I) -> Vec<Article>
where
    I: IntoIterator<Item = Article>,
{
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(ArticleKey::of(article)))
        .collect()
}

/// Sort newest first. Undated articles go after every dated one.
///
/// The sort is stable: ties and undated articles keep their incoming
/// (provider) order.
pub fn rank_by_recency(articles: &mut [Article]) {
    articles.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
