//! Screening questionnaire handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use calmly_core::Instrument;

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::{Caller, RequireAuth};
use crate::services::AssessmentService;
use crate::services::assessments::{QuestionSet, ScoreSubmission, SubmissionResult, question_set};
use crate::state::AppState;

/// GET /api/assessments/{instrument}/questions
///
/// `instrument` is `phq9` or `gad7`.
pub async fn questions(
    RequireAuth(_): RequireAuth,
    Path(instrument): Path<String>,
) -> Result<Json<QuestionSet>, AppError> {
    let instrument = Instrument::ALL
        .into_iter()
        .find(|i| i.as_str() == instrument)
        .ok_or_else(|| AppError::not_found(format!("Unknown questionnaire: {instrument}")))?;
    Ok(Json(question_set(instrument)))
}

/// POST /api/assessments
pub async fn submit(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(submission): JsonBody<ScoreSubmission>,
) -> Result<(StatusCode, Json<SubmissionResult>), AppError> {
    let result = AssessmentService::new(state.store())
        .submit(&caller.context, submission)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
