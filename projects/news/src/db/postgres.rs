use std::collections::HashMap;

use diesel::r2d2::ConnectionManager;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::{
    interaction::queries::{get_interaction, get_upvote_counts, upsert_vote},
    user::{
        models::NewUser,
        queries::{get_user_by_username, insert_user, InsertUserError},
    },
    CreateCredentialError, Credential, CredentialStore, InteractionStore, PgPool, StoreError,
    VoteOutcome,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Error)]
pub enum ConnectPoolError {
    #[error("BuildPool: {source}")]
    BuildPool {
        source: r2d2::Error,
    },
    #[error("GetConnectionFromPool: {source}")]
    GetConnectionFromPool {
        source: r2d2::Error,
    },
    #[error("RunMigrations: {message}")]
    RunMigrations {
        message: String,
    },
}

/// Builds the pool and brings the schema up to date before handing it out.
pub fn connect_pool(database_url: &str, max_size: u32) -> Result<PgPool, ConnectPoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = PgPool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|source| ConnectPoolError::BuildPool { source })?;

    let mut pooled = pool
        .get()
        .map_err(|source| ConnectPoolError::GetConnectionFromPool { source })?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| ConnectPoolError::RunMigrations { message: err.to_string() })?;
    info!(applied = applied.len(), "database migrations up to date");

    Ok(pool)
}

/// PostgreSQL-backed credential and interaction store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for PgStore {
    fn create_credential(&self, credential: &Credential) -> Result<(), CreateCredentialError> {
        let mut conn = self.pool.get().map_err(StoreError::from)?;
        let new = NewUser {
            id: Uuid::new_v4(),
            username: &credential.username,
            password_hash: &credential.password_hash,
        };

        match insert_user(&mut conn, &new) {
            Ok(_) => Ok(()),
            Err(InsertUserError::UsernameTaken) => Err(CreateCredentialError::DuplicateUsername {
                username: credential.username.clone(),
            }),
            Err(source) => Err(StoreError::from(source).into()),
        }
    }

    fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let mut conn = self.pool.get()?;
        let user = get_user_by_username(&mut conn, username)?;

        Ok(user.map(|user| Credential {
            username: user.username,
            password_hash: user.password_hash,
        }))
    }
}

impl InteractionStore for PgStore {
    fn upvote_counts(&self, article_ids: &[String]) -> Result<HashMap<String, i64>, StoreError> {
        let mut conn = self.pool.get()?;
        let rows = get_upvote_counts(&mut conn, article_ids)?;

        Ok(rows.into_iter().collect())
    }

    fn upvote_count(&self, article_id: &str) -> Result<i64, StoreError> {
        let mut conn = self.pool.get()?;
        let interaction = get_interaction(&mut conn, article_id)?;

        Ok(interaction.map_or(0, |interaction| interaction.upvotes))
    }

    fn record_vote(&self, article_id: &str, voter: &str) -> Result<VoteOutcome, StoreError> {
        let mut conn = self.pool.get()?;

        match upsert_vote(&mut conn, article_id, voter)? {
            Some(upvotes) => Ok(VoteOutcome::Counted(upvotes)),
            None => {
                // Voters are never removed, so the row exists and the count is stable for this voter.
                let upvotes = get_interaction(&mut conn, article_id)?
                    .map_or(0, |interaction| interaction.upvotes);
                Ok(VoteOutcome::AlreadyVoted(upvotes))
            }
        }
    }
}
