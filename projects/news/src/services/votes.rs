use std::sync::Arc;

use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, info};

use crate::db::{InteractionStore, StoreError, VoteOutcome};

#[derive(Debug, Error)]
pub enum CastVoteError {
    #[error("{message}")]
    InvalidInput {
        message: &'static str,
    },
    /// Not a failure of the store: nothing changed and `upvotes` is the current count.
    #[error("AlreadyVoted: {upvotes}")]
    AlreadyVoted {
        upvotes: i64,
    },
    #[error("Store: {source}")]
    Store {
        source: StoreError,
    },
    #[error("Worker: {source}")]
    Worker {
        source: JoinError,
    },
}

#[derive(Debug, Error)]
pub enum ReadUpvotesError {
    #[error("Store: {source}")]
    Store {
        source: StoreError,
    },
    #[error("Worker: {source}")]
    Worker {
        source: JoinError,
    },
}

/// One vote per (article, user), counted atomically by the store.
pub struct VoteService {
    interactions: Arc<dyn InteractionStore>,
}

impl VoteService {
    pub fn new(interactions: Arc<dyn InteractionStore>) -> Self {
        Self { interactions }
    }

    /// `username` must come from a verified token. Returns the new count.
    pub async fn cast_vote(&self, article_id: &str, username: &str) -> Result<i64, CastVoteError> {
        if article_id.trim().is_empty() {
            return Err(CastVoteError::InvalidInput { message: "articleId required" });
        }

        let store = Arc::clone(&self.interactions);
        let article = article_id.to_string();
        let voter = username.to_string();

        let outcome = spawn_blocking(move || store.record_vote(&article, &voter))
            .await
            .map_err(|source| CastVoteError::Worker { source })?
            .map_err(|source| CastVoteError::Store { source })?;

        match outcome {
            VoteOutcome::Counted(upvotes) => {
                info!(%article_id, %username, upvotes, "upvote recorded");
                Ok(upvotes)
            }
            VoteOutcome::AlreadyVoted(upvotes) => {
                debug!(%article_id, %username, "user already upvoted");
                Err(CastVoteError::AlreadyVoted { upvotes })
            }
        }
    }

    /// Stored count, 0 for articles nobody voted on.
    pub async fn upvotes(&self, article_id: &str) -> Result<i64, ReadUpvotesError> {
        let store = Arc::clone(&self.interactions);
        let article = article_id.to_string();

        spawn_blocking(move || store.upvote_count(&article))
            .await
            .map_err(|source| ReadUpvotesError::Worker { source })?
            .map_err(|source| ReadUpvotesError::Store { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[tokio::test]
    async fn n_distinct_votes_give_n_upvotes() {
        let store = Arc::new(MemoryStore::new());
        let votes = VoteService::new(store.clone());

        for (i, user) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(votes.cast_vote("https://x.test/1", user).await.unwrap(), i as i64 + 1);
        }

        assert_eq!(votes.upvotes("https://x.test/1").await.unwrap(), 4);
        assert_eq!(store.voters("https://x.test/1").unwrap().len(), 4);
    }

    #[tokio::test]
    async fn repeat_vote_reports_current_count_without_change() {
        let votes = VoteService::new(Arc::new(MemoryStore::new()));
        votes.cast_vote("id", "alice").await.unwrap();
        votes.cast_vote("id", "bob").await.unwrap();

        let err = votes.cast_vote("id", "alice").await.unwrap_err();

        assert!(matches!(err, CastVoteError::AlreadyVoted { upvotes: 2 }));
        assert_eq!(votes.upvotes("id").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn votes_are_scoped_per_article() {
        let votes = VoteService::new(Arc::new(MemoryStore::new()));
        votes.cast_vote("one", "alice").await.unwrap();

        assert_eq!(votes.cast_vote("two", "alice").await.unwrap(), 1);
        assert_eq!(votes.upvotes("three").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_article_id_is_rejected() {
        let votes = VoteService::new(Arc::new(MemoryStore::new()));

        assert!(matches!(
            votes.cast_vote("  ", "alice").await,
            Err(CastVoteError::InvalidInput { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_are_not_lost() {
        let votes = Arc::new(VoteService::new(Arc::new(MemoryStore::new())));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let votes = Arc::clone(&votes);
                tokio::spawn(async move { votes.cast_vote("hot", &format!("user-{i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(votes.upvotes("hot").await.unwrap(), 64);
    }
}
