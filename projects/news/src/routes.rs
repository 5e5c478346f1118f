use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::endpoints::{
    auth::{login::index::handler as auth_login_handler, register::index::handler as auth_register_handler},
    health::read::index::handler as health_read_handler,
    interactions::read::index::handler as interactions_read_handler,
    news::read::index::handler as news_read_handler,
    upvotes::create::index::handler as upvotes_create_handler,
};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_read_handler))
        .route("/api/news", get(news_read_handler))
        .route("/api/interactions/{article_id}", get(interactions_read_handler))
        .route("/api/upvotes", post(upvotes_create_handler))
        .route("/api/auth/register", post(auth_register_handler))
        .route("/api/auth/login", post(auth_login_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
