use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    crypto::token::TokenCodec,
    error::{AppError, Result},
    models::user::Principal,
    repositories::session::SessionRepository,
    services::identity::IdentityVerifier,
    state::AppState,
};

/// The name of the cookie carrying the session ID.
pub const SESSION_COOKIE: &str = "recipes_api";

/// Cookie-mode state: where sessions live and how long they last.
#[derive(Clone)]
pub struct CookieAuth {
    pub sessions: Arc<dyn SessionRepository>,
    pub session_duration_days: i64,
}

/// The authentication mechanism chosen at startup.
///
/// Exactly one variant is active for the lifetime of the process; it decides
/// which auth endpoints are mounted and how protected routes are gated.
#[derive(Clone)]
pub enum AuthGate {
    /// Signed tokens in the `Authorization` header.
    Token(TokenCodec),
    /// Server-side sessions referenced by the session cookie.
    Cookie(CookieAuth),
    /// Tokens validated by a third-party identity provider.
    Identity(Arc<dyn IdentityVerifier>),
}

impl AuthGate {
    /// Decides whether a request may reach a protected handler.
    pub async fn authorize(&self, headers: &HeaderMap, cookies: &Cookies) -> Result<Principal> {
        match self {
            AuthGate::Token(codec) => {
                let token = extract_token(headers).ok_or_else(|| {
                    AppError::Authentication("Missing authorization token".to_string())
                })?;
                let claims = codec.verify_unexpired(token)?;
                Ok(Principal {
                    username: claims.username,
                })
            }

            AuthGate::Cookie(cookie_auth) => {
                let session_id = extract_session_id(cookies).ok_or_else(|| {
                    tracing::warn!("❌ No session cookie found");
                    AppError::Forbidden
                })?;

                let session = cookie_auth
                    .sessions
                    .load(&session_id)
                    .await
                    .map_err(|e| {
                        tracing::warn!("❌ Session lookup failed: {}", e);
                        AppError::Forbidden
                    })?
                    .ok_or_else(|| {
                        tracing::warn!("❌ Unknown session: {}", session_id);
                        AppError::Forbidden
                    })?;

                if session.token.is_empty() {
                    tracing::warn!("❌ Session without token: {}", session_id);
                    return Err(AppError::Forbidden);
                }

                if session.expires_at <= Utc::now() {
                    tracing::warn!("❌ Session expired: {}", session_id);
                    return Err(AppError::Forbidden);
                }

                Ok(Principal {
                    username: session.username,
                })
            }

            AuthGate::Identity(verifier) => {
                let token = extract_token(headers).ok_or_else(|| {
                    AppError::Authentication("Invalid token".to_string())
                })?;
                let claims = verifier.validate(token).await?;
                Ok(Principal {
                    username: claims.sub,
                })
            }
        }
    }

    /// The token codec, when running in token mode.
    pub fn token_codec(&self) -> Option<&TokenCodec> {
        match self {
            AuthGate::Token(codec) => Some(codec),
            _ => None,
        }
    }

    /// The session settings, when running in cookie mode.
    pub fn cookie_auth(&self) -> Option<&CookieAuth> {
        match self {
            AuthGate::Cookie(cookie_auth) => Some(cookie_auth),
            _ => None,
        }
    }
}

/// Extracts the raw token from the `Authorization` header.
///
/// Both a bare token and `Bearer <token>` are accepted.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();

    if token.is_empty() { None } else { Some(token) }
}

/// Extracts the session ID from the request cookies.
pub fn extract_session_id(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that lets a request through only if the active gate accepts it.
///
/// On success the caller's [`Principal`] is added to the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking authentication...");

    match state.auth.authorize(request.headers(), &cookies).await {
        Ok(principal) => {
            tracing::debug!("✅ User authenticated: {}", principal.username);
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
