//! Signed claims tokens for the `JWT` auth mechanism.
//!
//! Tokens are HS256 JWTs carrying the username and an absolute expiry.
//! `verify` only checks structure and signature; expiry is enforced by
//! callers through [`TokenCodec::verify_unexpired`] so that `refresh` can
//! still read the claims of a token that is about to expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of a token issued at sign-in.
pub const SIGN_IN_TTL_MINUTES: i64 = 10;
/// Lifetime of a token issued by refresh.
pub const REFRESH_TTL_MINUTES: i64 = 5;
/// A token may only be refreshed once its remaining lifetime is at most this.
pub const REFRESH_GRACE_SECONDS: i64 = 30;

/// Errors produced while issuing or checking a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not expired yet")]
    NotYetExpirable,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// The payload embedded in a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Whether the token is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Seconds left before expiry at `now`; negative once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.exp - now.timestamp()
    }
}

/// A freshly signed token and its expiry, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Issues and verifies tokens under a symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Signs a token for `username` expiring `ttl` from now.
    pub fn issue(&self, username: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        self.issue_at(username, Utc::now(), ttl)
    }

    fn issue_at(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let exp = (issued_at + ttl).timestamp();
        let claims = Claims {
            username: username.to_string(),
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let expires = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Signing(format!("expiry out of range: {}", exp)))?;

        Ok(IssuedToken { token, expires })
    }

    /// Checks structure and signature, returning the claims even if expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })
    }

    /// Like [`verify`](Self::verify), but also rejects expired tokens.
    pub fn verify_unexpired(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.is_expired(Utc::now()) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Re-issues a token that is within the grace window of its expiry, or past it.
    pub fn refresh(&self, token: &str, new_ttl: Duration) -> Result<IssuedToken, TokenError> {
        let claims = self.verify(token)?;
        let now = Utc::now();

        if claims.remaining_seconds(now) > REFRESH_GRACE_SECONDS {
            return Err(TokenError::NotYetExpirable);
        }

        self.issue_at(&claims.username, now, new_ttl)
    }
}
