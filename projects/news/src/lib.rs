//! News aggregation service with per-article upvotes
//!
//! - REST API endpoints in `endpoints/`
//! - upstream merge, voting and auth logic in `services/`
//! - PostgreSQL models and queries in `db/`, with an in-memory fallback
//! - Requires JWT_SECRET; NEWS_API_KEY and DATABASE_URL are optional

pub mod config;
pub mod db;
pub mod endpoints;
pub mod routes;
pub mod services;
pub mod state;
