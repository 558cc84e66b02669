use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// Represents a stored recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// The server-generated identifier.
    pub id: Uuid,
    /// The name of the recipe.
    pub name: String,
    /// Free-form tags used by search.
    pub tags: Vec<String>,
    /// The ingredient list, in order.
    pub ingredients: Vec<String>,
    /// The preparation steps, in order.
    pub instructions: Vec<String>,
    /// The timestamp when the recipe was created.
    pub published_at: DateTime<Utc>,
}

impl Recipe {
    /// Builds a new recipe from client input, stamping a fresh ID and the current time.
    pub fn new(input: RecipeInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            tags: input.tags,
            ingredients: input.ingredients,
            instructions: input.instructions,
            published_at: Utc::now(),
        }
    }
}

impl From<&Row> for Recipe {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            tags: row.get("tags"),
            ingredients: row.get("ingredients"),
            instructions: row.get("instructions"),
            published_at: row.get("published_at"),
        }
    }
}

/// The client-writable fields of a recipe.
///
/// `id` and `publishedAt` are ignored if a client sends them.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipeInput {
    #[garde(length(min = 1, max = 500))]
    pub name: String,
    #[garde(skip)]
    pub tags: Vec<String>,
    #[garde(skip)]
    pub ingredients: Vec<String>,
    #[garde(skip)]
    pub instructions: Vec<String>,
}
