//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` (`tower_sessions.session`) and hold
//! only the signed-in [`CurrentUser`](crate::models::CurrentUser). The
//! session cookie is signed with a key derived from `CALMLY_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::CalmlyConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "calmly_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the cookie signing key from the configured secret.
///
/// A SHA-512 digest is exactly the 64 bytes `Key` requires.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer with a `PostgreSQL` store.
///
/// The table must already exist; it is created by the migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &CalmlyConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let secret = SecretString::from("a-long-session-secret-for-tests-0123456789");
        let other = SecretString::from("another-long-session-secret-for-tests-9876");

        assert_eq!(signing_key(&secret).master(), signing_key(&secret).master());
        assert_ne!(signing_key(&secret).master(), signing_key(&other).master());
        assert_eq!(signing_key(&secret).signing().len(), 32);
    }
}
