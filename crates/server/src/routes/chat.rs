//! Chat companion handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::db::PgStore;
use crate::error::AppError;
use crate::genai::GeminiClient;
use crate::middleware::Caller;
use crate::models::ChatMessage;
use crate::random::ThreadRandom;
use crate::services::ChatOrchestrator;
use crate::services::chat::TurnOutcome;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub saved: usize,
}

fn orchestrator(state: &AppState) -> ChatOrchestrator<'_, PgStore, GeminiClient, ThreadRandom> {
    ChatOrchestrator::new(
        state.store(),
        state.generator(),
        state.random(),
        state.config().gemini.timeout,
    )
}

/// GET /api/chat/history
pub async fn history(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<HistoryResponse>, AppError> {
    let messages = orchestrator(&state).history(&caller.context).await?;
    Ok(Json(HistoryResponse { messages }))
}

/// POST /api/chat/messages
///
/// Always answers with a reply; generation problems become fallback text.
pub async fn send_message(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let outcome = orchestrator(&state)
        .send_turn(&caller.context, &request.message)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/chat/save
pub async fn save(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let saved = orchestrator(&state)
        .save_transcript(&caller.context, request.messages)
        .await?;
    Ok(Json(SaveResponse {
        success: true,
        saved,
    }))
}

/// DELETE /api/chat/clear
pub async fn clear(State(state): State<AppState>, caller: Caller) -> Result<StatusCode, AppError> {
    orchestrator(&state).clear(&caller.context).await?;
    Ok(StatusCode::NO_CONTENT)
}
