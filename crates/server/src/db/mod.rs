//! Database access for Calmly.
//!
//! Each entity has a narrow store trait (`UserStore`, `ScoreStore`, ...)
//! that services are generic over. [`PgStore`] implements all of them on a
//! `PostgreSQL` pool; tests substitute in-memory implementations.
//!
//! All trait methods return `impl Future + Send`, so no `async-trait`
//! crate is needed.
//!
//! # Tables
//!
//! - `app_user` - accounts, roles and student profiles
//! - `institution` - colleges and universities
//! - `therapist` - counsellors attached to an institution
//! - `booking` - student appointments with therapists
//! - `assessment_score` - PHQ-9 / GAD-7 submissions (append-only)
//! - `chat_history` - one JSONB transcript per user
//! - `forum_post`, `forum_reply`, `forum_upvote` - peer-support forum
//! - `tower_sessions.session` - HTTP sessions
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p calmly-cli -- migrate
//! ```

pub mod bookings;
pub mod chat;
pub mod forum;
pub mod institutions;
pub mod scores;
pub mod therapists;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use bookings::BookingStore;
pub use chat::ChatHistoryStore;
pub use forum::ForumStore;
pub use institutions::InstitutionStore;
pub use scores::ScoreStore;
pub use therapists::TherapistStore;
pub use users::UserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(message.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// The production store: every entity trait backed by one pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Parse a stored e-mail, treating failure as corruption.
fn stored_email(raw: &str) -> Result<calmly_core::Email, RepositoryError> {
    calmly_core::Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email {raw:?}: {e}")))
}
