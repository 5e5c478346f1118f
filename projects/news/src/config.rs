use std::{env, fmt::Display, str::FromStr};

use interfaces_newsapi_articles::index::DEFAULT_BASE_URL;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_pool_size: u32,
    pub jwt_secret: String,
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing: {key}")]
    Missing {
        key: &'static str,
    },
    #[error("Invalid {key}: {message}")]
    Invalid {
        key: &'static str,
        message: String,
    },
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;

        let database_url = var("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not provided, users and votes are kept in memory only");
        }

        let news_api_key = var("NEWS_API_KEY");
        if news_api_key.is_none() {
            warn!("NEWS_API_KEY not provided, /api/news will fail");
        }

        Ok(Self {
            port: parse_or(var("PORT"), "PORT", 3000)?,
            database_url,
            database_pool_size: parse_or(var("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE", 10)?,
            jwt_secret,
            news_api_key,
            news_api_base_url: var("NEWS_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(value) => value
            .trim()
            .parse()
            .map_err(|err: T::Err| ConfigError::Invalid { key, message: err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database_pool_size, 10);
        assert_eq!(config.database_url, None);
        assert_eq!(config.news_api_key, None);
        assert_eq!(config.news_api_base_url, "https://newsapi.org/v2");
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing { key: "JWT_SECRET" })));
        assert!(matches!(config(&[("JWT_SECRET", "  ")]), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn malformed_port_is_reported() {
        let err = config(&[("JWT_SECRET", "s"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config(&[
            ("JWT_SECRET", "s"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/news"),
            ("NEWS_API_KEY", "key"),
            ("NEWS_API_BASE_URL", "http://127.0.0.1:9000/v2"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/news"));
        assert_eq!(config.news_api_key.as_deref(), Some("key"));
        assert_eq!(config.news_api_base_url, "http://127.0.0.1:9000/v2");
    }
}
