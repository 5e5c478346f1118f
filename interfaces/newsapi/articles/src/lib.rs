//! Client for the NewsAPI article listings
//!
//! - `/top-headlines` and `/everything` via [`index::Endpoint`]
//! - provider errors keep their HTTP status and message

pub mod index;
