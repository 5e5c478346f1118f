use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum IssueTokenError {
    #[error("EncodeToken: {source}")]
    EncodeToken {
        source: jsonwebtoken::errors::Error,
    },
}

#[derive(Debug, Error)]
pub enum VerifyTokenError {
    #[error("MissingToken")]
    MissingToken,
    #[error("InvalidToken: {source}")]
    InvalidToken {
        source: jsonwebtoken::errors::Error,
    },
}

/// Signs and checks HS256 identity tokens with one process-wide secret.
///
/// Tokens carry no `exp`; a token stays valid for as long as the secret does.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, IssueTokenError> {
        let claims = Claims {
            username: username.to_string(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|source| IssueTokenError::EncodeToken { source })
    }

    /// Returns the username the token was issued for.
    pub fn verify(&self, token: &str) -> Result<String, VerifyTokenError> {
        if token.trim().is_empty() {
            return Err(VerifyTokenError::MissingToken);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.username)
            .map_err(|source| VerifyTokenError::InvalidToken { source })
    }
}
