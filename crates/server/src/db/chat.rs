//! Per-user chat transcripts.
//!
//! One row per user; each save replaces the whole transcript, so concurrent
//! writers resolve last-write-wins.

use std::future::Future;

use sqlx::types::Json;

use calmly_core::UserId;

use super::{PgStore, RepositoryError};
use crate::models::ChatMessage;

pub trait ChatHistoryStore: Send + Sync {
    /// The stored transcript, empty when none exists.
    fn load_history(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Insert or replace the transcript.
    fn save_history(
        &self,
        user_id: UserId,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn clear_history(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl ChatHistoryStore for PgStore {
    async fn load_history(&self, user_id: UserId) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages: Option<Json<Vec<ChatMessage>>> =
            sqlx::query_scalar("SELECT messages FROM chat_history WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(messages.map(|Json(m)| m).unwrap_or_default())
    }

    async fn save_history(
        &self,
        user_id: UserId,
        messages: &[ChatMessage],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_history (user_id, messages) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET messages = EXCLUDED.messages, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(Json(messages))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_history(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_history WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
