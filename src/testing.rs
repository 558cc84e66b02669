//! In-memory stand-ins for the stores and the identity provider.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        recipe::{Recipe, RecipeInput},
        session::Session,
    },
    repositories::{recipe::RecipeRepository, session::SessionRepository, user::UserRepository},
    services::{
        auth::hash_password,
        identity::{IdentityClaims, IdentityVerifier},
    },
};

pub fn soup() -> RecipeInput {
    RecipeInput {
        name: "Soup".to_string(),
        tags: vec!["dinner".to_string()],
        ingredients: vec!["water".to_string()],
        instructions: vec!["boil".to_string()],
    }
}

#[derive(Default)]
pub struct MemoryRecipeRepository {
    recipes: Mutex<Vec<Recipe>>,
}

impl MemoryRecipeRepository {
    pub fn snapshot(&self) -> Vec<Recipe> {
        self.recipes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeRepository for MemoryRecipeRepository {
    async fn insert(&self, recipe: &Recipe) -> Result<()> {
        self.recipes.lock().unwrap().push(recipe.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Recipe>> {
        Ok(self.snapshot())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Recipe>> {
        Ok(self.snapshot().into_iter().find(|r| r.id == *id))
    }

    async fn find_by_tag(&self, tag: &str) -> Result<Vec<Recipe>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .collect())
    }

    async fn update(&self, id: &Uuid, input: &RecipeInput) -> Result<bool> {
        let mut recipes = self.recipes.lock().unwrap();
        match recipes.iter_mut().find(|r| r.id == *id) {
            Some(recipe) => {
                recipe.name = input.name.clone();
                recipe.tags = input.tags.clone();
                recipe.ingredients = input.ingredients.clone();
                recipe.instructions = input.instructions.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut recipes = self.recipes.lock().unwrap();
        let before = recipes.len();
        recipes.retain(|r| r.id != *id);
        Ok(recipes.len() != before)
    }
}

/// Fails every call, as an unreachable database would.
pub struct FailingRecipeRepository;

#[async_trait]
impl RecipeRepository for FailingRecipeRepository {
    async fn insert(&self, _recipe: &Recipe) -> Result<()> {
        Err(AppError::Internal("store offline".to_string()))
    }

    async fn list(&self) -> Result<Vec<Recipe>> {
        Err(AppError::Internal("store offline".to_string()))
    }

    async fn find_by_id(&self, _id: &Uuid) -> Result<Option<Recipe>> {
        Err(AppError::Internal("store offline".to_string()))
    }

    async fn find_by_tag(&self, _tag: &str) -> Result<Vec<Recipe>> {
        Err(AppError::Internal("store offline".to_string()))
    }

    async fn update(&self, _id: &Uuid, _input: &RecipeInput) -> Result<bool> {
        Err(AppError::Internal("store offline".to_string()))
    }

    async fn delete(&self, _id: &Uuid) -> Result<bool> {
        Err(AppError::Internal("store offline".to_string()))
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: HashMap<String, String>,
}

impl MemoryUserRepository {
    pub fn with_user(username: &str, password: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(username.to_string(), hash_password(password).unwrap());
        Self { users }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_password_hash(&self, username: &str) -> Result<Option<String>> {
        Ok(self.users.get(username).cloned())
    }
}

pub struct FailingUserRepository;

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn find_password_hash(&self, _username: &str) -> Result<Option<String>> {
        Err(AppError::Internal("store offline".to_string()))
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<HashMap<Uuid, (Session, u64)>>,
}

impl MemorySessionRepository {
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }

    pub fn ttl_of(&self, session_id: &Uuid) -> Option<u64> {
        self.sessions.lock().unwrap().get(session_id).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn save(&self, session_id: &Uuid, session: &Session, ttl_seconds: u64) -> Result<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(*session_id, (session.clone(), ttl_seconds));
        Ok(())
    }

    async fn load(&self, session_id: &Uuid) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|(session, _)| session.clone()))
    }

    async fn delete(&self, session_id: &Uuid) -> Result<()> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

/// Accepts exactly one token, standing in for the identity provider.
pub struct StaticIdentityVerifier {
    pub token: String,
    pub subject: String,
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn validate(&self, token: &str) -> Result<IdentityClaims> {
        if token == self.token {
            Ok(IdentityClaims {
                sub: self.subject.clone(),
            })
        } else {
            Err(AppError::Authentication("Invalid token".to_string()))
        }
    }
}
