use garde::Validate;
use serde::Deserialize;
use zeroize::ZeroizeOnDrop;

/// API user credentials, as sent to `/signin`.
#[derive(Deserialize, Validate, ZeroizeOnDrop)]
pub struct Credentials {
    /// The user's login.
    #[garde(length(min = 1, max = 255))]
    pub username: String,
    /// The user's plaintext password.
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The identity attached to a request that passed the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The authenticated user's login, or the provider subject in AUTH0 mode.
    pub username: String,
}
