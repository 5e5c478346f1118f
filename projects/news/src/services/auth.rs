use std::sync::Arc;

use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{info, warn};

use crate::db::{CreateCredentialError, Credential, CredentialStore, StoreError};
use crate::services::passwords::{hash_password, verify_password, PasswordError};
use crate::services::tokens::{IssueTokenError, TokenIssuer, VerifyTokenError};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("{message}")]
    InvalidInput {
        message: &'static str,
    },
    #[error("DuplicateUsername: {username}")]
    DuplicateUsername {
        username: String,
    },
    #[error("Password: {source}")]
    Password {
        source: PasswordError,
    },
    #[error("Store: {source}")]
    Store {
        source: StoreError,
    },
    #[error("Worker: {source}")]
    Worker {
        source: JoinError,
    },
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("{message}")]
    InvalidInput {
        message: &'static str,
    },
    #[error("UserNotFound: {username}")]
    UserNotFound {
        username: String,
    },
    #[error("InvalidCredentials")]
    InvalidCredentials,
    #[error("Password: {source}")]
    Password {
        source: PasswordError,
    },
    #[error("Store: {source}")]
    Store {
        source: StoreError,
    },
    #[error("IssueToken: {source}")]
    IssueToken {
        source: IssueTokenError,
    },
    #[error("Worker: {source}")]
    Worker {
        source: JoinError,
    },
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
}

pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialStore>, tokens: Arc<TokenIssuer>) -> Self {
        Self { credentials, tokens }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), RegisterError> {
        if username.is_empty() || password.is_empty() {
            return Err(RegisterError::InvalidInput { message: "Username and password required" });
        }
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(RegisterError::InvalidInput { message: "Username and password cannot be empty" });
        }

        let store = Arc::clone(&self.credentials);
        let username = username.to_string();
        let password = password.to_string();

        spawn_blocking(move || -> Result<(), RegisterError> {
            let password_hash = hash_password(&password)
                .map_err(|source| RegisterError::Password { source })?;
            let credential = Credential { username, password_hash };

            match store.create_credential(&credential) {
                Ok(()) => {
                    info!(username = %credential.username, "user registered");
                    Ok(())
                }
                Err(CreateCredentialError::DuplicateUsername { username }) => {
                    Err(RegisterError::DuplicateUsername { username })
                }
                Err(CreateCredentialError::Store { source }) => Err(RegisterError::Store { source }),
            }
        })
        .await
        .map_err(|source| RegisterError::Worker { source })?
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, LoginError> {
        if username.is_empty() || password.is_empty() {
            return Err(LoginError::InvalidInput { message: "Username and password required" });
        }

        let store = Arc::clone(&self.credentials);
        let lookup = username.to_string();
        let password = password.to_string();

        let credential = spawn_blocking(move || -> Result<Credential, LoginError> {
            let credential = store
                .find_credential(&lookup)
                .map_err(|source| LoginError::Store { source })?
                .ok_or(LoginError::UserNotFound { username: lookup })?;

            let matches = verify_password(&password, &credential.password_hash)
                .map_err(|source| LoginError::Password { source })?;
            if !matches {
                return Err(LoginError::InvalidCredentials);
            }

            Ok(credential)
        })
        .await
        .map_err(|source| LoginError::Worker { source })?
        .inspect_err(|err| {
            if matches!(err, LoginError::InvalidCredentials) {
                warn!(%username, "login with wrong password");
            }
        })?;

        let token = self
            .tokens
            .issue(&credential.username)
            .map_err(|source| LoginError::IssueToken { source })?;

        Ok(Session { token, username: credential.username })
    }

    pub fn verify(&self, token: &str) -> Result<String, VerifyTokenError> {
        self.tokens.verify(token)
    }
}
