use crate::crypto::session_token::generate_session_token;
use crate::crypto::token::{IssuedToken, TokenCodec, REFRESH_TTL_MINUTES, SIGN_IN_TTL_MINUTES};
use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::repositories::session::SessionRepository;
use crate::repositories::user::UserRepository;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Verified against when the user does not exist so both outcomes cost one
/// Argon2 run. Same parameters as [`hash_password`]; matches no password.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=3,p=1$k/GMTLJb3hJZSj5tm+8egA$n2Ui1SZ69wbHjiaXhL3jdnLjyJuBRRJthC/Hr92nNjw";

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-formatted hash.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a PHC hash.
///
/// The parameters are read from the hash itself.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Checks a username/password pair against the credential store.
///
/// Unknown users, wrong passwords and lookup failures all produce the same
/// `Authentication` error.
pub async fn authenticate(users: &dyn UserRepository, username: &str, password: &str) -> Result<()> {
    tracing::debug!("🔐 Authenticating user: {}", username);

    let stored_hash = match users.find_password_hash(username).await {
        Ok(Some(hash)) => hash,
        Ok(None) => {
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }
        Err(e) => {
            tracing::error!("❌ Credential lookup failed: {}", e);
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }
    };

    match verify_password(password, &stored_hash) {
        Ok(true) => {
            tracing::info!("✅ User authenticated: {}", username);
            Ok(())
        }
        Ok(false) => Err(AppError::Authentication(INVALID_CREDENTIALS.to_string())),
        Err(e) => {
            tracing::error!("❌ Stored credential for {} is unusable: {}", username, e);
            Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()))
        }
    }
}

/// Authenticates the user and issues a signed token valid for ten minutes.
pub async fn sign_in_with_token(
    users: &dyn UserRepository,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> Result<IssuedToken> {
    authenticate(users, username, password).await?;
    let issued = codec.issue(username, Duration::minutes(SIGN_IN_TTL_MINUTES))?;
    tracing::info!("✅ Token issued for {} (expires {})", username, issued.expires);
    Ok(issued)
}

/// Exchanges a token close to its expiry for one valid five more minutes.
pub fn refresh_token(codec: &TokenCodec, token: &str) -> Result<IssuedToken> {
    let issued = codec.refresh(token, Duration::minutes(REFRESH_TTL_MINUTES))?;
    tracing::info!("✅ Token refreshed (expires {})", issued.expires);
    Ok(issued)
}

/// Authenticates the user and opens a server-side session.
///
/// # Returns
///
/// The ID of the new session, to be handed to the client in a cookie.
pub async fn sign_in_with_session(
    users: &dyn UserRepository,
    sessions: &dyn SessionRepository,
    username: &str,
    password: &str,
    session_duration_days: i64,
) -> Result<Uuid> {
    authenticate(users, username, password).await?;

    let lifetime = Duration::try_days(session_duration_days)
        .filter(|d| *d > Duration::zero())
        .ok_or_else(|| {
            AppError::Internal(format!("Invalid session duration: {} days", session_duration_days))
        })?;
    let ttl_seconds = u64::try_from(lifetime.num_seconds())
        .map_err(|e| AppError::Internal(format!("Invalid session TTL: {}", e)))?;

    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let session = Session {
        username: username.to_string(),
        token: generate_session_token(),
        created_at: now,
        expires_at: now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AppError::Internal("Session expiry out of range".to_string()))?,
    };

    sessions.save(&session_id, &session, ttl_seconds).await?;

    tracing::info!("✅ Session opened for {}", username);
    Ok(session_id)
}

/// Closes a server-side session. Unknown sessions are ignored.
pub async fn sign_out(sessions: &dyn SessionRepository, session_id: &Uuid) -> Result<()> {
    sessions.delete(session_id).await?;
    tracing::info!("👋 Session closed: {}", session_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingUserRepository, MemorySessionRepository, MemoryUserRepository};

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("correct-password").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-password", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn password_hashes_are_salted() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[tokio::test]
    async fn authenticate_collapses_failures() {
        let users = MemoryUserRepository::with_user("admin", "fCRmh4Q2J7Rseqkz");

        assert!(authenticate(&users, "admin", "fCRmh4Q2J7Rseqkz").await.is_ok());

        for (username, password) in [("admin", "nope"), ("ghost", "fCRmh4Q2J7Rseqkz")] {
            match authenticate(&users, username, password).await {
                Err(AppError::Authentication(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
                other => panic!("unexpected result: {:?}", other),
            }
        }

        match authenticate(&FailingUserRepository, "admin", "fCRmh4Q2J7Rseqkz").await {
            Err(AppError::Authentication(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn dummy_hash_runs_a_full_verification() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(!verify_password("fCRmh4Q2J7Rseqkz", DUMMY_PASSWORD_HASH).unwrap());
        assert!(!verify_password("", DUMMY_PASSWORD_HASH).unwrap());
    }

    #[tokio::test]
    async fn unknown_user_costs_as_much_as_wrong_password() {
        let users = MemoryUserRepository::with_user("admin", "fCRmh4Q2J7Rseqkz");

        async fn average(users: &MemoryUserRepository, username: &str) -> std::time::Duration {
            let start = std::time::Instant::now();
            for _ in 0..3 {
                assert!(authenticate(users, username, "wrong-password").await.is_err());
            }
            start.elapsed() / 3
        }

        let known = average(&users, "admin").await;
        let unknown = average(&users, "ghost").await;
        let failing = {
            let start = std::time::Instant::now();
            let _ = authenticate(&FailingUserRepository, "admin", "wrong-password").await;
            start.elapsed()
        };

        assert!(unknown * 4 >= known, "unknown {:?} vs known {:?}", unknown, known);
        assert!(failing * 4 >= known, "failing {:?} vs known {:?}", failing, known);
    }

    #[tokio::test]
    async fn session_sign_in_rejects_unusable_durations() {
        let users = MemoryUserRepository::with_user("admin", "fCRmh4Q2J7Rseqkz");
        let sessions = MemorySessionRepository::default();

        for days in [0, -3, 9_999_999_999_999] {
            let result =
                sign_in_with_session(&users, &sessions, "admin", "fCRmh4Q2J7Rseqkz", days).await;
            assert!(matches!(result, Err(AppError::Internal(_))), "days = {}", days);
        }
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn session_sign_in_and_sign_out() {
        let users = MemoryUserRepository::with_user("admin", "fCRmh4Q2J7Rseqkz");
        let sessions = MemorySessionRepository::default();

        let session_id = sign_in_with_session(&users, &sessions, "admin", "fCRmh4Q2J7Rseqkz", 7)
            .await
            .unwrap();

        let session = sessions.load(&session_id).await.unwrap().unwrap();
        assert_eq!(session.username, "admin");
        assert!(!session.token.is_empty());
        assert_eq!(session.expires_at - session.created_at, Duration::days(7));
        assert_eq!(sessions.ttl_of(&session_id), Some(7 * 86400));

        sign_out(&sessions, &session_id).await.unwrap();
        assert!(sessions.load(&session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_sign_in_with_bad_password_stores_nothing() {
        let users = MemoryUserRepository::with_user("admin", "fCRmh4Q2J7Rseqkz");
        let sessions = MemorySessionRepository::default();

        let result = sign_in_with_session(&users, &sessions, "admin", "wrong", 7).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert!(sessions.is_empty());
    }
}
