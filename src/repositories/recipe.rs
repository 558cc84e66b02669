use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::recipe::{Recipe, RecipeInput},
};

/// Persistence for recipes.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn insert(&self, recipe: &Recipe) -> Result<()>;

    /// Returns every recipe in store order.
    async fn list(&self) -> Result<Vec<Recipe>>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Recipe>>;

    /// Returns the recipes whose tags contain `tag` exactly.
    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Recipe>>;

    /// Replaces the mutable fields. Returns `false` when no recipe matched.
    async fn update(&self, id: &Uuid, input: &RecipeInput) -> Result<bool>;

    /// Returns `false` when no recipe matched.
    async fn delete(&self, id: &Uuid) -> Result<bool>;
}

/// Recipes stored in the `recipes` table.
#[derive(Clone)]
pub struct PgRecipeRepository {
    pool: Pool,
}

impl PgRecipeRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn insert(&self, recipe: &Recipe) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO recipes (id, name, tags, ingredients, instructions, published_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                &[
                    &recipe.id,
                    &recipe.name,
                    &recipe.tags,
                    &recipe.ingredients,
                    &recipe.instructions,
                    &recipe.published_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Recipe>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, name, tags, ingredients, instructions, published_at
                FROM recipes
                "#,
                &[],
            )
            .await?;
        Ok(rows.iter().map(Recipe::from).collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Recipe>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, name, tags, ingredients, instructions, published_at
                FROM recipes
                WHERE id = $1
                "#,
                &[id],
            )
            .await?;
        Ok(row.as_ref().map(Recipe::from))
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Recipe>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, name, tags, ingredients, instructions, published_at
                FROM recipes
                WHERE $1 = ANY(tags)
                "#,
                &[&tag],
            )
            .await?;
        Ok(rows.iter().map(Recipe::from).collect())
    }

    async fn update(&self, id: &Uuid, input: &RecipeInput) -> Result<bool> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                r#"
                UPDATE recipes
                SET
                    name = $1,
                    tags = $2,
                    ingredients = $3,
                    instructions = $4
                WHERE id = $5
                "#,
                &[
                    &input.name,
                    &input.tags,
                    &input.ingredients,
                    &input.instructions,
                    id,
                ],
            )
            .await?;
        Ok(matched > 0)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM recipes WHERE id = $1", &[id])
            .await?;
        Ok(deleted > 0)
    }
}
