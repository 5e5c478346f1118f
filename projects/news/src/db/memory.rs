use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use crate::db::{
    CreateCredentialError, Credential, CredentialStore, InteractionStore, StoreError, VoteOutcome,
};

#[derive(Debug, Default)]
struct Tally {
    upvotes: i64,
    upvoted_by: BTreeSet<String>,
}

/// Process-local store used when no database is configured, and by tests.
///
/// Every operation runs under a single lock, so a vote's membership check,
/// increment and insert are one step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: Mutex<HashMap<String, Credential>>,
    interactions: Mutex<HashMap<String, Tally>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Voters recorded for `article_id`, sorted.
    pub fn voters(&self, article_id: &str) -> Result<Vec<String>, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| StoreError::LockPoisoned)?;

        Ok(interactions
            .get(article_id)
            .map(|tally| tally.upvoted_by.iter().cloned().collect())
            .unwrap_or_default())
    }
}

impl CredentialStore for MemoryStore {
    fn create_credential(&self, credential: &Credential) -> Result<(), CreateCredentialError> {
        let mut credentials = self.credentials.lock().map_err(|_| StoreError::LockPoisoned)?;

        if credentials.contains_key(&credential.username) {
            return Err(CreateCredentialError::DuplicateUsername {
                username: credential.username.clone(),
            });
        }
        credentials.insert(credential.username.clone(), credential.clone());

        Ok(())
    }

    fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let credentials = self.credentials.lock().map_err(|_| StoreError::LockPoisoned)?;

        Ok(credentials.get(username).cloned())
    }
}

impl InteractionStore for MemoryStore {
    fn upvote_counts(&self, article_ids: &[String]) -> Result<HashMap<String, i64>, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| StoreError::LockPoisoned)?;

        Ok(article_ids
            .iter()
            .filter_map(|id| interactions.get(id).map(|tally| (id.clone(), tally.upvotes)))
            .collect())
    }

    fn upvote_count(&self, article_id: &str) -> Result<i64, StoreError> {
        let interactions = self.interactions.lock().map_err(|_| StoreError::LockPoisoned)?;

        Ok(interactions.get(article_id).map_or(0, |tally| tally.upvotes))
    }

    fn record_vote(&self, article_id: &str, voter: &str) -> Result<VoteOutcome, StoreError> {
        let mut interactions = self.interactions.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tally = interactions.entry(article_id.to_string()).or_default();

        if tally.upvoted_by.contains(voter) {
            return Ok(VoteOutcome::AlreadyVoted(tally.upvotes));
        }
        tally.upvoted_by.insert(voter.to_string());
        tally.upvotes += 1;

        Ok(VoteOutcome::Counted(tally.upvotes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(username: &str) -> Credential {
        Credential {
            username: username.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[test]
    fn duplicate_username_is_rejected_without_overwrite() {
        let store = MemoryStore::new();
        store.create_credential(&credential("alice")).unwrap();

        let mut second = credential("alice");
        second.password_hash = "other".to_string();
        let err = store.create_credential(&second).unwrap_err();

        assert!(matches!(err, CreateCredentialError::DuplicateUsername { ref username } if username == "alice"));
        assert_eq!(store.find_credential("alice").unwrap().unwrap().password_hash, "hash");
    }

    #[test]
    fn second_vote_by_same_user_is_not_counted() {
        let store = MemoryStore::new();

        assert_eq!(store.record_vote("a", "alice").unwrap(), VoteOutcome::Counted(1));
        assert_eq!(store.record_vote("a", "bob").unwrap(), VoteOutcome::Counted(2));
        assert_eq!(store.record_vote("a", "alice").unwrap(), VoteOutcome::AlreadyVoted(2));
        assert_eq!(store.voters("a").unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn counts_leave_out_unknown_ids() {
        let store = MemoryStore::new();
        store.record_vote("a", "alice").unwrap();

        let counts = store
            .upvote_counts(&["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(counts.len(), 1);
        assert_eq!(counts["a"], 1);
        assert_eq!(store.upvote_count("b").unwrap(), 0);
    }
}
