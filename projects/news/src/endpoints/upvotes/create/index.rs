use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::endpoints::{error_response, identity::VerifiedUser};
use crate::services::votes::CastVoteError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    RequestBody {
        #[from]
        source: JsonRejection,
    },
    #[error("articleId is not valid percent-encoded UTF-8")]
    MalformedArticleId,
    #[error(transparent)]
    CastVote {
        #[from]
        source: CastVoteError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::RequestBody { source } => error_response(source.status(), source.body_text()),
            HandlerError::MalformedArticleId => error_response(StatusCode::BAD_REQUEST, self.to_string()),
            HandlerError::CastVote { source } => match source {
                CastVoteError::AlreadyVoted { upvotes } => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Already upvoted", "upvotes": upvotes })),
                )
                    .into_response(),
                CastVoteError::InvalidInput { message } => error_response(StatusCode::BAD_REQUEST, message),
                source => {
                    error!(%source, "recording upvote failed");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error upvoting")
                }
            },
        }
    }
}

/// JSON payload expected by the endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteRequestBody {
    #[serde(default)]
    article_id: String,
}

#[derive(Debug, Serialize)]
pub struct UpvoteResponse {
    pub upvotes: i64,
}

/// Axum handler: POST /api/upvotes
///
/// Clients send `encodeURIComponent(url)`, so the id is decoded once here.
pub async fn handler(
    Extension(state): Extension<Arc<AppState>>,
    VerifiedUser(username): VerifiedUser,
    input: Result<Json<UpvoteRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Json(input) = input?;
    let article_id = urlencoding::decode(&input.article_id)
        .map_err(|_| HandlerError::MalformedArticleId)?;

    let upvotes = state.votes.cast_vote(&article_id, &username).await?;

    Ok((StatusCode::OK, Json(UpvoteResponse { upvotes })))
}
