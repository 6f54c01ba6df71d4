//! History store collaborator.
//!
//! Persistence belongs to the caller. The pipeline only hands over a
//! finished [`AnalysisResult`]; what a store does with it is its business.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use veracity_core::AnalysisResult;

/// Errors from a history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to save analysis: {0}")]
    Save(String),
}

/// Per-user record of past analyses.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, user_id: &str, result: &AnalysisResult) -> Result<(), HistoryError>;

    /// Up to `limit` results, most recent first.
    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError>;
}

/// Default number of results kept per user.
pub const DEFAULT_MAX_PER_USER: usize = 100;

/// Default number of distinct users tracked.
pub const DEFAULT_MAX_USERS: usize = 10_000;

/// Bounded in-memory store for the CLI, development and tests.
///
/// Each user keeps at most `max_per_user` results, oldest evicted first.
/// Once `max_users` users are tracked, saves for a new user fail with
/// [`HistoryError::Save`]; existing users keep working.
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    entries: RwLock<HashMap<String, VecDeque<AnalysisResult>>>,
    max_per_user: usize,
    max_users: usize,
}

impl InMemoryHistoryStore {
    pub fn new(max_per_user: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_per_user: max_per_user.max(1),
            max_users: DEFAULT_MAX_USERS,
        }
    }

    pub fn with_max_users(mut self, max_users: usize) -> Self {
        self.max_users = max_users.max(1);
        self
    }

    pub fn user_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn len(&self, user_id: &str) -> usize {
        self.entries.read().get(user_id).map_or(0, VecDeque::len)
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_USER)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn save(&self, user_id: &str, result: &AnalysisResult) -> Result<(), HistoryError> {
        let mut entries = self.entries.write();
        if !entries.contains_key(user_id) && entries.len() >= self.max_users {
            return Err(HistoryError::Save(format!(
                "user limit of {} reached",
                self.max_users
            )));
        }
        let history = entries.entry(user_id.to_string()).or_default();

        history.push_front(result.clone());
        history.truncate(self.max_per_user);
        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<AnalysisResult>, HistoryError> {
        Ok(self
            .entries
            .read()
            .get(user_id)
            .map(|h| h.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::sample_result;

    #[tokio::test]
    async fn test_list_most_recent_first() {
        let store = InMemoryHistoryStore::default();
        store.save("alice", &sample_result("first")).await.unwrap();
        store.save("alice", &sample_result("second")).await.unwrap();
        store.save("bob", &sample_result("other")).await.unwrap();

        let history = store.list("alice", 10).await.unwrap();
        let excerpts: Vec<_> = history.iter().map(|r| r.text_excerpt.as_str()).collect();
        assert_eq!(excerpts, vec!["second", "first"]);
        assert!(store.list("carol", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bounded_per_user() {
        let store = InMemoryHistoryStore::new(2);
        for excerpt in ["a", "b", "c"] {
            store.save("alice", &sample_result(excerpt)).await.unwrap();
        }

        assert_eq!(store.len("alice"), 2);
        let history = store.list("alice", 1).await.unwrap();
        assert_eq!(history[0].text_excerpt, "c");
    }

    #[tokio::test]
    async fn test_user_limit_rejects_new_users_only() {
        let store = InMemoryHistoryStore::new(5).with_max_users(2);
        store.save("alice", &sample_result("a")).await.unwrap();
        store.save("bob", &sample_result("b")).await.unwrap();

        let err = store.save("carol", &sample_result("c")).await.unwrap_err();
        assert!(matches!(err, HistoryError::Save(_)));
        assert_eq!(store.user_count(), 2);

        store.save("alice", &sample_result("a2")).await.unwrap();
        assert_eq!(store.len("alice"), 2);
        assert!(store.list("carol", 10).await.unwrap().is_empty());
    }
}
