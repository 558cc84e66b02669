use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::error::Result;

/// Read access to stored credentials.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the stored password digest for `username`, if the user exists.
    async fn find_password_hash(&self, username: &str) -> Result<Option<String>>;
}

/// Credentials stored in the `users` table.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_password_hash(&self, username: &str) -> Result<Option<String>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT password
                FROM users
                WHERE username = $1
                "#,
                &[&username],
            )
            .await?;
        Ok(row.map(|r| r.get("password")))
    }
}
