use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

use crate::endpoints::error_response;
use crate::services::tokens::VerifyTokenError;
use crate::state::AppState;

/// Username proven by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser(pub String);

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Access denied. No token provided.")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken {
        source: VerifyTokenError,
    },
    #[error("AppStateMissing")]
    AppStateMissing,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        match self {
            IdentityError::MissingToken => error_response(StatusCode::UNAUTHORIZED, self.to_string()),
            IdentityError::InvalidToken { ref source } => {
                warn!(%source, "rejected token");
                error_response(StatusCode::FORBIDDEN, self.to_string())
            }
            IdentityError::AppStateMissing => error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or(IdentityError::AppStateMissing)?;
        let token = bearer_token(parts).ok_or(IdentityError::MissingToken)?;

        state
            .auth
            .verify(token)
            .map(VerifiedUser)
            .map_err(|source| match source {
                VerifyTokenError::MissingToken => IdentityError::MissingToken,
                source => IdentityError::InvalidToken { source },
            })
    }
}
