//! Text generation for the chat companion.
//!
//! [`TextGenerator`] is the seam the chat orchestrator depends on;
//! [`GeminiClient`] is the production implementation.

mod client;
mod error;
mod types;

use std::future::Future;

pub use client::GeminiClient;
pub use error::GenerationError;
pub use types::{GenerateRequest, GenerateResponse};

/// Produces a reply for a fully assembled prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}
