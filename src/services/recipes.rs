use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::recipe::{Recipe, RecipeInput},
    repositories::recipe::RecipeRepository,
};

/// Parses a recipe ID from a path segment.
///
/// An ID that is not a valid UUID cannot match any recipe, so it is reported
/// as not found rather than as a bad request.
pub fn parse_recipe_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

/// Creates a recipe with a fresh ID and publication time.
pub async fn create_recipe(recipes: &dyn RecipeRepository, input: RecipeInput) -> Result<Recipe> {
    let recipe = Recipe::new(input);
    recipes.insert(&recipe).await?;
    tracing::info!("✅ Recipe created: {}", recipe.id);
    Ok(recipe)
}

/// Lists all recipes.
pub async fn list_recipes(recipes: &dyn RecipeRepository) -> Result<Vec<Recipe>> {
    recipes.list().await
}

/// Gets a single recipe.
pub async fn get_recipe(recipes: &dyn RecipeRepository, id: &Uuid) -> Result<Recipe> {
    recipes.find_by_id(id).await?.ok_or(AppError::NotFound)
}

/// Lists the recipes tagged exactly `tag` (case-sensitive).
pub async fn search_recipes(recipes: &dyn RecipeRepository, tag: &str) -> Result<Vec<Recipe>> {
    recipes.find_by_tag(tag).await
}

/// Replaces the mutable fields of a recipe.
pub async fn update_recipe(
    recipes: &dyn RecipeRepository,
    id: &Uuid,
    input: &RecipeInput,
) -> Result<()> {
    if !recipes.update(id, input).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Recipe updated: {}", id);
    Ok(())
}

/// Deletes a recipe.
pub async fn delete_recipe(recipes: &dyn RecipeRepository, id: &Uuid) -> Result<()> {
    if !recipes.delete(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!("🗑️ Recipe deleted: {}", id);
    Ok(())
}
