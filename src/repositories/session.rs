use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// Key-value storage of server-side sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores `session` under `session_id` for `ttl_seconds`.
    async fn save(&self, session_id: &Uuid, session: &Session, ttl_seconds: u64) -> Result<()>;

    async fn load(&self, session_id: &Uuid) -> Result<Option<Session>>;

    async fn delete(&self, session_id: &Uuid) -> Result<()>;
}

/// Sessions stored as JSON in Redis.
#[derive(Clone)]
pub struct RedisSessionRepository {
    redis: ConnectionManager,
}

impl RedisSessionRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(session_id: &Uuid) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn save(&self, session_id: &Uuid, session: &Session, ttl_seconds: u64) -> Result<()> {
        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let mut redis = self.redis.clone();
        let _: () = redis
            .set_ex(Self::key(session_id), &session_json, ttl_seconds)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                AppError::Redis(e)
            })?;

        tracing::debug!("✅ Session saved to Redis: session:{}", session_id);
        Ok(())
    }

    async fn load(&self, session_id: &Uuid) -> Result<Option<Session>> {
        let mut redis = self.redis.clone();
        let session_json: Option<String> = redis.get(Self::key(session_id)).await?;

        match session_json {
            Some(json) => {
                let session = sonic_rs::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Invalid session JSON: {}", e))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Uuid) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.del(Self::key(session_id)).await?;
        tracing::debug!("✅ Session deleted from Redis: session:{}", session_id);
        Ok(())
    }
}
