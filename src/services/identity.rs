//! Bearer token validation against a third-party identity provider.
//!
//! The provider publishes its signing keys at
//! `https://{domain}/.well-known/jwks.json`. Keys are fetched on first use
//! and fetched again when a token names a key id we have not seen, at most
//! once per [`MIN_REFETCH_INTERVAL`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};

const INVALID_TOKEN: &str = "Invalid token";

/// Unknown key ids trigger at most one key fetch per interval.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Claims we read from a provider-issued access token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    /// The provider's subject identifier for the user.
    pub sub: String,
}

/// Validates bearer tokens issued by an external provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn validate(&self, token: &str) -> Result<IdentityClaims>;
}

#[derive(Default)]
struct KeyCache {
    keys: Option<JwkSet>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.as_ref().and_then(|keys| keys.find(kid))
    }
}

/// Auth0-style verifier: RS256 tokens checked against the tenant's JWKS.
pub struct Auth0Verifier {
    jwks_url: String,
    issuer: String,
    audience: String,
    http_client: Client,
    min_refetch_interval: Duration,
    cache: RwLock<KeyCache>,
}

fn key_from_jwk(jwk: &Jwk, kid: &str) -> Result<DecodingKey> {
    DecodingKey::from_jwk(jwk)
        .map_err(|e| AppError::Internal(format!("Unusable JWK {}: {}", kid, e)))
}

impl Auth0Verifier {
    pub fn new(domain: &str, audience: &str) -> Self {
        let issuer = format!("https://{}/", domain.trim_end_matches('/'));
        let jwks_url = format!("{}.well-known/jwks.json", issuer);
        Self::with_endpoints(issuer, jwks_url, audience)
    }

    fn with_endpoints(issuer: String, jwks_url: String, audience: &str) -> Self {
        Self {
            jwks_url,
            issuer,
            audience: audience.to_string(),
            http_client: Client::new(),
            min_refetch_interval: MIN_REFETCH_INTERVAL,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    #[cfg(test)]
    fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    async fn fetch_keys(&self) -> Result<JwkSet> {
        tracing::info!("🔑 Fetching identity provider keys from {}", self.jwks_url);

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(format!("JWKS fetch failed: {}", e)))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid JWKS document: {}", e)))
    }

    /// Finds the decoding key for `kid`, refreshing the key set on a miss
    /// unless the last fetch was too recent.
    async fn decoding_key(&self, kid: &str) -> Result<Option<DecodingKey>> {
        if let Some(jwk) = self.cache.read().await.find(kid) {
            return key_from_jwk(jwk, kid).map(Some);
        }

        let mut cache = self.cache.write().await;
        if let Some(jwk) = cache.find(kid) {
            return key_from_jwk(jwk, kid).map(Some);
        }

        if let Some(fetched_at) = cache.fetched_at {
            if fetched_at.elapsed() < self.min_refetch_interval {
                tracing::debug!("Unknown key id {} within refetch interval", kid);
                return Ok(None);
            }
        }

        let fetched = self.fetch_keys().await;
        cache.fetched_at = Some(Instant::now());
        let fresh = fetched?;

        let key = match fresh.find(kid) {
            Some(jwk) => Some(key_from_jwk(jwk, kid)?),
            None => None,
        };
        cache.keys = Some(fresh);

        Ok(key)
    }

    async fn validate_inner(&self, token: &str) -> Result<IdentityClaims> {
        let header = decode_header(token)
            .map_err(|_| AppError::Authentication(INVALID_TOKEN.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Authentication(INVALID_TOKEN.to_string()));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Authentication(INVALID_TOKEN.to_string()))?;

        let key = self
            .decoding_key(&kid)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_TOKEN.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        decode::<IdentityClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Identity token rejected: {}", e);
                AppError::Authentication(INVALID_TOKEN.to_string())
            })
    }
}

#[async_trait]
impl IdentityVerifier for Auth0Verifier {
    async fn validate(&self, token: &str) -> Result<IdentityClaims> {
        self.validate_inner(token).await.map_err(|e| match e {
            AppError::Authentication(_) => e,
            other => {
                tracing::error!("❌ Identity validation failed: {}", other);
                AppError::Authentication(INVALID_TOKEN.to_string())
            }
        })
    }
}
