use diesel::prelude::*;
use diesel::sql_types::Text;
use thiserror::Error;
use crate::db::{interaction::models::*, schema::interactions::dsl::*};

#[derive(Debug, Error)]
pub enum GetUpvoteCountsError {
    #[error("GetUpvoteCounts: {source}")]
    GetUpvoteCounts{
        #[from]
        source: diesel::result::Error
    },
}

/// One round trip for every id; ids without a row are simply absent.
pub fn get_upvote_counts(
    conn: &mut PgConnection,
    article_ids: &[String]
) -> Result<Vec<(String, i64)>, GetUpvoteCountsError> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }

    interactions
        .filter(article_id.eq_any(article_ids))
        .select((article_id, upvotes))
        .load::<(String, i64)>(conn)
        .map_err(|source| GetUpvoteCountsError::GetUpvoteCounts{ source })
}

#[derive(Debug, Error)]
pub enum GetInteractionError {
    #[error("GetInteraction: {source}")]
    GetInteraction{
        #[from]
        source: diesel::result::Error
    },
}

pub fn get_interaction(
    conn: &mut PgConnection,
    article_id_val: &str
) -> Result<Option<Interaction>, GetInteractionError> {
    interactions
        .find(article_id_val)
        .select(Interaction::as_select())
        .first(conn)
        .optional()
        .map_err(|source| GetInteractionError::GetInteraction{ source })
}

// Inserts the row on first vote; otherwise appends the voter unless already present.
// Returns no row when the voter was already recorded.
const UPSERT_VOTE: &str = "\
    INSERT INTO interactions (article_id, upvotes, upvoted_by) \
    VALUES ($1, 1, ARRAY[$2]) \
    ON CONFLICT (article_id) DO UPDATE \
    SET upvotes = interactions.upvotes + 1, \
        upvoted_by = array_append(interactions.upvoted_by, $2), \
        updated_at = NOW() \
    WHERE NOT ($2 = ANY(interactions.upvoted_by)) \
    RETURNING upvotes";

#[derive(Debug, Error)]
pub enum UpsertVoteError {
    #[error("UpsertVote: {source}")]
    UpsertVote{
        #[from]
        source: diesel::result::Error
    },
}

/// `Some(new_count)` when the vote was counted, `None` when `voter` had already voted.
pub fn upsert_vote(
    conn: &mut PgConnection,
    article_id_val: &str,
    voter: &str
) -> Result<Option<i64>, UpsertVoteError> {
    diesel::sql_query(UPSERT_VOTE)
        .bind::<Text, _>(article_id_val)
        .bind::<Text, _>(voter)
        .get_result::<UpvoteCount>(conn)
        .optional()
        .map(|row| row.map(|row| row.upvotes))
        .map_err(|source| UpsertVoteError::UpsertVote{ source })
}
