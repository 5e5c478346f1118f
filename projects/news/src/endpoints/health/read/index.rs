use axum::{extract::Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Axum handler: GET /health
pub async fn handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
