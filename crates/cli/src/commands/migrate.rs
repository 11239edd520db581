//! Database migration command.
//!
//! Applies every pending migration from `crates/server/migrations/`,
//! including the `tower_sessions` schema used for HTTP sessions.

use super::{CliError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
