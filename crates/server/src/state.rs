//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CalmlyConfig;
use crate::db::PgStore;
use crate::genai::{GeminiClient, GenerationError};
use crate::random::ThreadRandom;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the only long-lived resources: the
/// database pool and the HTTP client for generation.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CalmlyConfig,
    store: PgStore,
    generator: GeminiClient,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the generation HTTP client cannot be built.
    pub fn new(config: CalmlyConfig, pool: PgPool) -> Result<Self, GenerationError> {
        let generator = GeminiClient::new(&config.gemini)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store: PgStore::new(pool),
                generator,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CalmlyConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &PgStore {
        &self.inner.store
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }

    #[must_use]
    pub fn generator(&self) -> &GeminiClient {
        &self.inner.generator
    }

    #[must_use]
    pub const fn random(&self) -> &ThreadRandom {
        &ThreadRandom
    }
}
