//! Calmly Core - shared types and screening logic.
//!
//! Used by:
//! - `server` - the JSON API for students and institution admins
//! - `cli` - migrations and management commands
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Everything here can be tested without
//! a running service.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, e-mail addresses, roles and statuses
//! - [`assessment`] - PHQ-9 / GAD-7 scoring and severity bands
//! - [`crisis`] - Self-harm phrase detection and helpline data
//! - [`analytics`] - Monthly and per-band aggregation of scores
//! - [`access`] - Role and institution checks on the caller

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod analytics;
pub mod assessment;
pub mod crisis;
pub mod types;

pub use access::{AccessError, RequestContext};
pub use assessment::{Assessment, Instrument, Responses, ScoringError, Severity};
pub use types::*;
