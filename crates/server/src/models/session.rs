//! Session-stored identity.

use serde::{Deserialize, Serialize};

use calmly_core::{Email, UserId};

/// Minimal identity kept in the session cookie's server-side record.
///
/// Role and institution are deliberately absent: they change during
/// onboarding and are re-read from the database on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
