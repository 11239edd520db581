//! Calmly server library.
//!
//! The JSON API behind the Calmly web client: PHQ-9/GAD-7 screenings, a
//! crisis-aware chat companion, therapist bookings, a peer-support forum
//! and institution analytics. Exposed as a library so the integration
//! tests can drive the services and router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod genai;
pub mod middleware;
pub mod models;
pub mod random;
pub mod routes;
pub mod services;
pub mod state;
