use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A server-side session, stored in Redis under `session:{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The user this session belongs to.
    pub username: String,
    /// The opaque token issued at sign-in.
    pub token: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}
