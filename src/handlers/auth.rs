use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::{extract_session_id, extract_token, SESSION_COOKIE},
    models::user::Credentials,
    services::auth as auth_service,
    state::AppState,
    validation::payload::ValidatedJson,
};

/// The response payload for cookie sign-in and sign-out.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Creates the session cookie with the given value and max age.
fn create_session_cookie(value: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::days(max_age_days));
    cookie.set_path("/");

    cookie
}

fn not_enabled(endpoint: &str) -> AppError {
    AppError::Internal(format!(
        "{} called while its auth mechanism is not active",
        endpoint
    ))
}

/// Signs a user in and returns a token valid for ten minutes.
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Response> {
    tracing::info!("🔐 Sign-in attempt: {}", credentials.username);

    let codec = state
        .auth
        .token_codec()
        .ok_or_else(|| not_enabled("/signin"))?;

    let issued = auth_service::sign_in_with_token(
        state.users.as_ref(),
        codec,
        &credentials.username,
        &credentials.password,
    )
    .await?;

    Ok((StatusCode::OK, Json(issued)).into_response())
}

/// Exchanges a token that is about to expire for a new one.
#[axum::debug_handler]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let codec = state
        .auth
        .token_codec()
        .ok_or_else(|| not_enabled("/refresh"))?;

    let token = extract_token(&headers)
        .ok_or_else(|| AppError::Authentication("Missing authorization token".to_string()))?;

    let issued = auth_service::refresh_token(codec, token)?;

    Ok((StatusCode::OK, Json(issued)).into_response())
}

/// Signs a user in and opens a server-side session referenced by a cookie.
#[axum::debug_handler]
pub async fn sign_in_with_cookie(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Response> {
    tracing::info!("🔐 Sign-in attempt: {}", credentials.username);

    let cookie_auth = state
        .auth
        .cookie_auth()
        .ok_or_else(|| not_enabled("/signin"))?;

    let session_id = auth_service::sign_in_with_session(
        state.users.as_ref(),
        cookie_auth.sessions.as_ref(),
        &credentials.username,
        &credentials.password,
        cookie_auth.session_duration_days,
    )
    .await?;

    cookies.add(create_session_cookie(
        session_id.to_string(),
        cookie_auth.session_duration_days,
        state.config.secure_cookies,
    ));
    tracing::debug!("✅ Session cookie added");

    let response = MessageResponse {
        message: "User signed in".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Clears the caller's session, if any.
#[axum::debug_handler]
pub async fn sign_out(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let cookie_auth = state
        .auth
        .cookie_auth()
        .ok_or_else(|| not_enabled("/signout"))?;

    if let Some(session_id) = extract_session_id(&cookies) {
        auth_service::sign_out(cookie_auth.sessions.as_ref(), &session_id).await?;
    }

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let response = MessageResponse {
        message: "Signed out...".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
