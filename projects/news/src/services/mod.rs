pub mod auth;
pub mod news;
pub mod passwords;
pub mod tokens;
pub mod votes;
