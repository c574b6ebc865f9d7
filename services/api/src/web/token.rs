//! services/api/src/web/token.rs
//!
//! Signed bearer tokens for stateless authentication. Tokens embed the user
//! id and username and expire after seven days.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to issue token: {0}")]
    Issue(String),
    #[error("Invalid token.")]
    Invalid,
}

/// The claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// The verified identity extracted from a bearer token, made available to
/// protected handlers via request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Issues and verifies HS256-signed bearer tokens.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a new token for the given user.
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verifies signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| TokenError::Invalid)?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)?;
        Ok(AuthUser {
            id,
            username: data.claims.username,
        })
    }
}
