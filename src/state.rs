use std::sync::Arc;

use redis::aio::ConnectionManager;

use crate::config::{AuthSettings, Config};
use crate::crypto::token::TokenCodec;
use crate::error::Result;
use crate::middleware_layer::auth::{AuthGate, CookieAuth};
use crate::repositories::{
    recipe::{PgRecipeRepository, RecipeRepository},
    session::RedisSessionRepository,
    user::{PgUserRepository, UserRepository},
};
use crate::services::identity::Auth0Verifier;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Recipe persistence.
    pub recipes: Arc<dyn RecipeRepository>,
    /// Credential lookups.
    pub users: Arc<dyn UserRepository>,
    /// The authentication mechanism selected at startup.
    pub auth: Arc<AuthGate>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState`, connecting to Postgres and, in cookie mode, Redis.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url, config.database_name.as_deref())?;
        crate::db::init_schema(&db).await?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        let auth = match &config.auth {
            AuthSettings::Jwt { secret } => {
                tracing::info!("✅ Token authentication enabled");
                AuthGate::Token(TokenCodec::new(secret))
            }
            AuthSettings::Cookie {
                redis_url,
                session_duration_days,
            } => {
                let redis_client = redis::Client::open(redis_url.as_str())?;
                let redis = ConnectionManager::new(redis_client).await?;
                tracing::info!("✅ Redis Connection Manager initialized for sessions");

                AuthGate::Cookie(CookieAuth {
                    sessions: Arc::new(RedisSessionRepository::new(redis)),
                    session_duration_days: *session_duration_days,
                })
            }
            AuthSettings::Auth0 { domain, audience } => {
                tracing::info!("✅ Identity provider authentication enabled ({})", domain);
                AuthGate::Identity(Arc::new(Auth0Verifier::new(domain, audience)))
            }
        };

        Ok(Self::from_parts(
            config.clone(),
            Arc::new(PgRecipeRepository::new(db.clone())),
            Arc::new(PgUserRepository::new(db)),
            auth,
        ))
    }

    /// Assembles a state from already-built collaborators.
    pub fn from_parts(
        config: Config,
        recipes: Arc<dyn RecipeRepository>,
        users: Arc<dyn UserRepository>,
        auth: AuthGate,
    ) -> Self {
        Self {
            recipes,
            users,
            auth: Arc::new(auth),
            config,
        }
    }
}
