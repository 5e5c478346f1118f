use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use interfaces_newsapi_articles::index::FetchArticlesError;
use thiserror::Error;
use tracing::error;

use crate::endpoints::error_response;
use crate::services::news::{AggregateNewsError, InvalidFilterError, NewsFilters, NewsQuery};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    QueryString {
        #[from]
        source: QueryRejection,
    },
    #[error(transparent)]
    InvalidFilter {
        #[from]
        source: InvalidFilterError,
    },
    #[error(transparent)]
    AggregateNews {
        #[from]
        source: AggregateNewsError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::QueryString { source } => error_response(source.status(), source.body_text()),
            HandlerError::InvalidFilter { source } => error_response(StatusCode::BAD_REQUEST, source.to_string()),
            HandlerError::AggregateNews { source } => match source {
                AggregateNewsError::FetchArticles {
                    source: FetchArticlesError::Upstream { status, message },
                } => {
                    let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    error_response(status, message)
                }
                AggregateNewsError::FetchArticles { source } => {
                    error!(%source, "news provider unreachable");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch news")
                }
                AggregateNewsError::SourceNotConfigured => {
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "News API key not configured")
                }
                source => {
                    error!(%source, "merging upvotes failed");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch news")
                }
            },
        }
    }
}

/// Axum handler: GET /api/news
pub async fn handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Query(query) = query?;
    let filters = NewsFilters::try_from(query)?;
    let page = state.news.aggregate(&filters).await?;

    Ok((StatusCode::OK, Json(page)))
}
