use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use http::{header, HeaderValue, Method};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, middleware_layer::auth::AuthGate, state::AppState};

/// Builds the CORS layer for the configured origin, if any.
fn cors_layer(origin_url: Option<&str>) -> Option<CorsLayer> {
    let origin = origin_url?;
    let origin = match origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!("⚠️ Ignoring invalid ORIGIN_URL {:?}: {}", origin, e);
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
            .expose_headers([header::CONTENT_LENGTH])
            .allow_credentials(true)
            .max_age(Duration::from_secs(12 * 3600)),
    )
}

/// Builds the application router.
///
/// The sign-in family of endpoints depends on the active auth mechanism:
/// `/signin` + `/refresh` for tokens, `/signin` + `/signout` for cookies,
/// and none for the identity provider.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/recipes", get(handlers::recipes::list_recipes))
        .route("/recipes/search", get(handlers::recipes::search_recipes))
        .route("/recipes/{id}", get(handlers::recipes::get_recipe))
        .with_state(state.clone());

    let auth_routes = match state.auth.as_ref() {
        AuthGate::Token(_) => Router::new()
            .route("/signin", post(handlers::auth::sign_in))
            .route("/refresh", post(handlers::auth::refresh)),
        AuthGate::Cookie(_) => Router::new()
            .route("/signin", post(handlers::auth::sign_in_with_cookie))
            .route("/signout", post(handlers::auth::sign_out)),
        AuthGate::Identity(_) => Router::new(),
    }
    .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/recipes", post(handlers::recipes::create_recipe))
        .route(
            "/recipes/{id}",
            axum::routing::put(handlers::recipes::update_recipe)
                .delete(handlers::recipes::delete_recipe),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new());

    match cors_layer(state.config.origin_url.as_deref()) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}
