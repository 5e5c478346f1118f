//! Runs the diesel store against a live database. Every test returns early
//! when `DATABASE_URL` is unset, so the suite stays green without Postgres.
use std::sync::Arc;

use anyhow::Result;
use projects_news::db::{
    postgres::{connect_pool, PgStore},
    CreateCredentialError, Credential, CredentialStore, InteractionStore, VoteOutcome,
};
use uuid::Uuid;

fn store() -> Result<Option<PgStore>> {
    let _ = dotenvy::dotenv();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return Ok(None);
    };
    Ok(Some(PgStore::new(connect_pool(&database_url, 8)?)))
}

// Rows outlive the test run, so every key carries a fresh suffix.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
async fn duplicate_username_is_reported() -> Result<()> {
    let Some(store) = store()? else { return Ok(()) };
    let credential = Credential {
        username: unique("alice"),
        password_hash: "$argon2id$placeholder".to_string(),
    };

    store.create_credential(&credential)?;
    let err = store.create_credential(&credential).unwrap_err();
    assert!(matches!(
        err,
        CreateCredentialError::DuplicateUsername { ref username } if *username == credential.username
    ));

    let found = store.find_credential(&credential.username)?;
    assert_eq!(found.map(|c| c.password_hash), Some(credential.password_hash));
    assert!(store.find_credential(&unique("nobody"))?.is_none());
    Ok(())
}

#[tokio::test]
async fn second_vote_from_same_user_is_not_counted() -> Result<()> {
    let Some(store) = store()? else { return Ok(()) };
    let article = unique("https://pg.test/article");

    assert_eq!(store.record_vote(&article, "alice")?, VoteOutcome::Counted(1));
    assert_eq!(store.record_vote(&article, "bob")?, VoteOutcome::Counted(2));
    assert_eq!(store.record_vote(&article, "alice")?, VoteOutcome::AlreadyVoted(2));
    assert_eq!(store.upvote_count(&article)?, 2);
    assert_eq!(store.upvote_count(&unique("https://pg.test/none"))?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_voters_all_count() -> Result<()> {
    let Some(store) = store()? else { return Ok(()) };
    let store = Arc::new(store);
    let article = unique("https://pg.test/hot");

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let store = Arc::clone(&store);
            let article = article.clone();
            tokio::task::spawn_blocking(move || store.record_vote(&article, &format!("user-{i}")))
        })
        .collect();
    for handle in handles {
        assert!(matches!(handle.await??, VoteOutcome::Counted(_)));
    }

    assert_eq!(store.upvote_count(&article)?, 32);
    Ok(())
}

#[tokio::test]
async fn batch_counts_skip_unknown_ids() -> Result<()> {
    let Some(store) = store()? else { return Ok(()) };
    let known = unique("https://pg.test/known");
    let unknown = unique("https://pg.test/unknown");
    store.record_vote(&known, "alice")?;

    let counts = store.upvote_counts(&[known.clone(), unknown.clone()])?;
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get(&known), Some(&1));
    assert!(!counts.contains_key(&unknown));

    assert!(store.upvote_counts(&[])?.is_empty());
    Ok(())
}
