use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::endpoints::error_response;
use crate::services::auth::LoginError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    RequestBody {
        #[from]
        source: JsonRejection,
    },
    #[error(transparent)]
    Login {
        #[from]
        source: LoginError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::RequestBody { source } => error_response(source.status(), source.body_text()),
            HandlerError::Login { source } => match source {
                LoginError::InvalidInput { message } => error_response(StatusCode::BAD_REQUEST, message),
                LoginError::UserNotFound { .. } => error_response(StatusCode::BAD_REQUEST, "User not found"),
                LoginError::InvalidCredentials => error_response(StatusCode::UNAUTHORIZED, "Invalid credentials"),
                source => {
                    error!(%source, "login failed");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error logging in")
                }
            },
        }
    }
}

/// JSON payload expected by the endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

/// Axum handler: POST /api/auth/login
pub async fn handler(
    Extension(state): Extension<Arc<AppState>>,
    input: Result<Json<LoginRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Json(input) = input?;
    let session = state.auth.login(&input.username, &input.password).await?;
    info!(username = %session.username, "user logged in");

    Ok((
        StatusCode::OK,
        Json(LoginResponse { token: session.token, username: session.username }),
    ))
}
