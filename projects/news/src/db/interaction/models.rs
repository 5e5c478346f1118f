use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::Int8;
use crate::db::schema::interactions;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = interactions)]
#[diesel(primary_key(article_id))]
pub struct Interaction {
    pub article_id: String,
    pub upvotes: i64,
    pub upvoted_by: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Row shape of `RETURNING upvotes` from raw vote statements.
#[derive(Debug, Clone, QueryableByName)]
pub struct UpvoteCount {
    #[diesel(sql_type = Int8)]
    pub upvotes: i64,
}
