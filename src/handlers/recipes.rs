use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::auth::MessageResponse,
    models::{recipe::RecipeInput, user::Principal},
    services::recipes as recipe_service,
    state::AppState,
    validation::payload::ValidatedJson,
};

/// The query parameters for searching recipes.
#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub tag: Option<String>,
}

fn message(text: &str) -> Response {
    let response = MessageResponse {
        message: text.to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Creates a new recipe.
#[axum::debug_handler]
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(input): ValidatedJson<RecipeInput>,
) -> Result<Response> {
    tracing::debug!("📝 {} is creating recipe {:?}", principal.username, input.name);

    let recipe = recipe_service::create_recipe(state.recipes.as_ref(), input).await?;

    Ok((StatusCode::OK, Json(recipe)).into_response())
}

/// Lists all recipes.
#[axum::debug_handler]
pub async fn list_recipes(State(state): State<AppState>) -> Result<Response> {
    let recipes = recipe_service::list_recipes(state.recipes.as_ref()).await?;
    Ok((StatusCode::OK, Json(recipes)).into_response())
}

/// Gets a single recipe.
#[axum::debug_handler]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = recipe_service::parse_recipe_id(&id)?;
    let recipe = recipe_service::get_recipe(state.recipes.as_ref(), &id).await?;
    Ok((StatusCode::OK, Json(recipe)).into_response())
}

/// Searches recipes by tag.
#[axum::debug_handler]
pub async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let tag = query.tag.unwrap_or_default();
    let recipes = recipe_service::search_recipes(state.recipes.as_ref(), &tag).await?;
    Ok((StatusCode::OK, Json(recipes)).into_response())
}

/// Updates an existing recipe.
#[axum::debug_handler]
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<RecipeInput>,
) -> Result<Response> {
    tracing::debug!("✏️ {} is updating recipe {}", principal.username, id);

    let id = recipe_service::parse_recipe_id(&id)?;
    recipe_service::update_recipe(state.recipes.as_ref(), &id, &input).await?;

    Ok(message("Recipe has been updated"))
}

/// Deletes an existing recipe.
#[axum::debug_handler]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Response> {
    tracing::debug!("🗑️ {} is deleting recipe {}", principal.username, id);

    let id = recipe_service::parse_recipe_id(&id)?;
    recipe_service::delete_recipe(state.recipes.as_ref(), &id).await?;

    Ok(message("Recipe has been deleted"))
}
