use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// The longest session lifetime accepted in `SESSION_DURATION_DAYS`.
const MAX_SESSION_DURATION_DAYS: i64 = 365;

/// The authentication mechanism selected at startup, with its settings.
#[derive(Clone)]
pub enum AuthSettings {
    /// Stateless signed tokens carried in the `Authorization` header.
    Jwt {
        /// The symmetric signing secret.
        secret: Zeroizing<Vec<u8>>,
    },
    /// Server-side sessions stored in Redis, referenced by a cookie.
    Cookie {
        /// The URL of the Redis server.
        redis_url: String,
        /// The duration of a session in days.
        session_duration_days: i64,
    },
    /// Bearer tokens validated by a third-party identity provider.
    Auth0 {
        /// The provider's domain, e.g. `tenant.eu.auth0.com`.
        domain: String,
        /// The expected audience (API identifier).
        audience: String,
    },
}

impl AuthSettings {
    /// The mechanism name as configured in `AUTH_MECHANISM`.
    pub fn name(&self) -> &'static str {
        match self {
            AuthSettings::Jwt { .. } => "JWT",
            AuthSettings::Cookie { .. } => "COOKIE",
            AuthSettings::Auth0 { .. } => "AUTH0",
        }
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mechanism = lookup("AUTH_MECHANISM").unwrap_or_else(|| "JWT".to_string());

        match mechanism.trim().to_ascii_uppercase().as_str() {
            "JWT" => {
                let secret = lookup("JWT_SECRET")
                    .filter(|s| !s.is_empty())
                    .context("JWT_SECRET must be set when AUTH_MECHANISM=JWT")?;
                Ok(AuthSettings::Jwt {
                    secret: Zeroizing::new(secret.into_bytes()),
                })
            }
            "COOKIE" => Ok(AuthSettings::Cookie {
                redis_url: lookup("REDIS_URL")
                    .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                session_duration_days: parse_session_duration(
                    lookup("SESSION_DURATION_DAYS").as_deref().unwrap_or("7"),
                )?,
            }),
            "AUTH0" => Ok(AuthSettings::Auth0 {
                domain: lookup("AUTH0_DOMAIN")
                    .context("AUTH0_DOMAIN must be set when AUTH_MECHANISM=AUTH0")?,
                audience: lookup("AUTH0_API_IDENTIFIER")
                    .context("AUTH0_API_IDENTIFIER must be set when AUTH_MECHANISM=AUTH0")?,
            }),
            other => anyhow::bail!(
                "Unknown AUTH_MECHANISM '{}' (expected JWT, COOKIE or AUTH0)",
                other
            ),
        }
    }
}

fn parse_session_duration(value: &str) -> Result<i64> {
    let days: i64 = value
        .trim()
        .parse()
        .context("Invalid SESSION_DURATION_DAYS")?;

    if !(1..=MAX_SESSION_DURATION_DAYS).contains(&days) {
        anyhow::bail!(
            "SESSION_DURATION_DAYS must be between 1 and {} (got {})",
            MAX_SESSION_DURATION_DAYS,
            days
        );
    }

    Ok(days)
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// Overrides the database name found in `database_url`.
    pub database_name: Option<String>,
    /// The selected authentication mechanism.
    pub auth: AuthSettings,
    /// The origin allowed by CORS, if any.
    pub origin_url: Option<String>,
    /// The address the server listens on.
    pub bind_addr: SocketAddr,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthSettings::from_lookup(&lookup)?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_name: lookup("DATABASE_NAME").filter(|s| !s.is_empty()),
            auth,
            origin_url: lookup("ORIGIN_URL").filter(|s| !s.is_empty()),
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:8080".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            secure_cookies: lookup("APP_ENV")
                .unwrap_or_else(|| "development".to_string())
                == "production",
        })
    }
}
