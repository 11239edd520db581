//! Core types for Calmly.
//!
//! Type-safe wrappers for identifiers, e-mail addresses and the small
//! closed sets (roles, statuses) stored in the database.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
