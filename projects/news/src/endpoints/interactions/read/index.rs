use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::endpoints::error_response;
use crate::services::votes::ReadUpvotesError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    PathSegment {
        #[from]
        source: PathRejection,
    },
    #[error(transparent)]
    ReadUpvotes {
        #[from]
        source: ReadUpvotesError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::PathSegment { source } => error_response(source.status(), source.body_text()),
            HandlerError::ReadUpvotes { source } => {
                error!(%source, "reading upvotes failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching interactions")
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InteractionResponse {
    pub upvotes: i64,
}

/// Axum handler: GET /api/interactions/{article_id}
///
/// The path segment is the percent-encoded article url; the router decodes it.
pub async fn handler(
    Extension(state): Extension<Arc<AppState>>,
    article_id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Path(article_id) = article_id?;
    let upvotes = state.votes.upvotes(&article_id).await?;
    debug!(%article_id, upvotes, "interactions read");

    Ok((StatusCode::OK, Json(InteractionResponse { upvotes })))
}
