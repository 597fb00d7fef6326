//! JWT token issuance

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use passport_db::{Application, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub uid: i64,
    /// User email
    pub email: String,
    /// Application ID the token is scoped to
    pub app: i32,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Application signing secret is empty")]
    EmptySecret,

    #[error("TTL out of range")]
    TtlOutOfRange,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Produces signed session tokens
pub trait TokenSigner: Send + Sync {
    /// Sign a token for `user` with `app`'s secret, valid for `ttl`
    fn issue(&self, user: &User, app: &Application, ttl: Duration) -> Result<String, TokenError>;
}

/// HS256 signer keyed by each application's own secret
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtIssuer;

impl JwtIssuer {
    pub fn new() -> Self {
        Self
    }
}

impl TokenSigner for JwtIssuer {
    fn issue(&self, user: &User, app: &Application, ttl: Duration) -> Result<String, TokenError> {
        if app.secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::TtlOutOfRange)?;
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(TokenError::TtlOutOfRange)?;

        let claims = Claims {
            uid: user.id,
            email: user.email.clone(),
            app: app.id,
            exp: exp.timestamp(),
        };

        debug!(user_id = user.id, app_id = app.id, "Signing token");

        let key = EncodingKey::from_secret(&app.secret);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }
}

/// Validate a token against an application secret and return its claims
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }

    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}
