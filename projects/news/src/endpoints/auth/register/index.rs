use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::endpoints::error_response;
use crate::services::auth::RegisterError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    RequestBody {
        #[from]
        source: JsonRejection,
    },
    #[error(transparent)]
    Register {
        #[from]
        source: RegisterError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::RequestBody { source } => error_response(source.status(), source.body_text()),
            HandlerError::Register { source } => match source {
                RegisterError::InvalidInput { message } => error_response(StatusCode::BAD_REQUEST, message),
                RegisterError::DuplicateUsername { .. } => {
                    error_response(StatusCode::BAD_REQUEST, "Username already exists")
                }
                source => {
                    error!(%source, "registration failed");
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Error registering user: {source}"),
                    )
                }
            },
        }
    }
}

/// JSON payload expected by the endpoint.
#[derive(Debug, Deserialize)]
pub struct RegisterRequestBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Axum handler: POST /api/auth/register
pub async fn handler(
    Extension(state): Extension<Arc<AppState>>,
    input: Result<Json<RegisterRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Json(input) = input?;
    state.auth.register(&input.username, &input.password).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered" }))))
}
