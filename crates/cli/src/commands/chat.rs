//! Chat transcript maintenance.
//!
//! Used to honour deletion requests for students who can no longer sign in.

use calmly_core::Email;
use calmly_server::db::{ChatHistoryStore, PgStore, UserStore};

use super::{CliError, connect};

/// Delete the stored transcript of the account registered under `email`.
pub async fn clear(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    let store = PgStore::new(connect().await?);
    let (user, _) = store
        .find_credentials(&email)
        .await?
        .ok_or_else(|| CliError::UnknownUser(email.to_string()))?;

    store.clear_history(user.id).await?;

    tracing::info!(user_id = %user.id, "Chat history cleared for {}", email);
    Ok(())
}
