//! Institution listing.

use calmly_server::db::{InstitutionStore, PgStore};

use super::{CliError, connect};

/// Log every registered institution with its id.
pub async fn list() -> Result<(), CliError> {
    let store = PgStore::new(connect().await?);
    let institutions = store.list_institutions().await?;

    if institutions.is_empty() {
        tracing::info!("No institutions registered");
        return Ok(());
    }

    for institution in &institutions {
        tracing::info!(id = %institution.id, "{}", institution.name);
    }
    tracing::info!("{} institution(s)", institutions.len());
    Ok(())
}
