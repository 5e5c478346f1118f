pub mod schema;
pub mod user;
pub mod interaction;
pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use thiserror::Error;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Stored credential for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}

/// Result of a single vote attempt. Both arms carry the count after the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Counted(i64),
    AlreadyVoted(i64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("GetConnectionFromPool: {source}")]
    GetConnectionFromPool {
        #[from]
        source: r2d2::Error,
    },
    #[error(transparent)]
    InsertUser {
        #[from]
        source: user::queries::InsertUserError,
    },
    #[error(transparent)]
    GetUserByUsername {
        #[from]
        source: user::queries::GetUserByUsernameError,
    },
    #[error(transparent)]
    GetUpvoteCounts {
        #[from]
        source: interaction::queries::GetUpvoteCountsError,
    },
    #[error(transparent)]
    GetInteraction {
        #[from]
        source: interaction::queries::GetInteractionError,
    },
    #[error(transparent)]
    UpsertVote {
        #[from]
        source: interaction::queries::UpsertVoteError,
    },
    #[error("LockPoisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum CreateCredentialError {
    #[error("DuplicateUsername: {username}")]
    DuplicateUsername {
        username: String,
    },
    #[error(transparent)]
    Store {
        #[from]
        source: StoreError,
    },
}

/// Username/password-hash records. Usernames are unique.
pub trait CredentialStore: Send + Sync + 'static {
    /// Fails with `DuplicateUsername` when the name is taken; never overwrites.
    fn create_credential(&self, credential: &Credential) -> Result<(), CreateCredentialError>;

    fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError>;
}

/// Per-article vote tallies keyed by article id.
pub trait InteractionStore: Send + Sync + 'static {
    /// Counts for every known id in `article_ids`. Unknown ids are left out.
    fn upvote_counts(&self, article_ids: &[String]) -> Result<HashMap<String, i64>, StoreError>;

    fn upvote_count(&self, article_id: &str) -> Result<i64, StoreError>;

    /// Adds `voter` to the article's voter set and bumps the count as one atomic step.
    fn record_vote(&self, article_id: &str, voter: &str) -> Result<VoteOutcome, StoreError>;
}
