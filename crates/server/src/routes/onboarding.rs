//! Onboarding and settings handlers.

use axum::{Json, extract::State, http::StatusCode};

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{Institution, NewInstitution, User};
use crate::services::OnboardingService;
use crate::services::onboarding::{RoleSelection, StudentOnboarding, UserUpdate};
use crate::state::AppState;

/// POST /api/onboarding/role
pub async fn choose_role(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(selection): JsonBody<RoleSelection>,
) -> Result<Json<User>, AppError> {
    let user = OnboardingService::new(state.store())
        .choose_role(&caller.context, selection)
        .await?;
    Ok(Json(user))
}

/// POST /api/onboarding/student
pub async fn student(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(form): JsonBody<StudentOnboarding>,
) -> Result<Json<User>, AppError> {
    let user = OnboardingService::new(state.store())
        .complete_student(&caller.context, form)
        .await?;
    Ok(Json(user))
}

/// POST /api/onboarding/institution
pub async fn institution(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(form): JsonBody<NewInstitution>,
) -> Result<(StatusCode, Json<Institution>), AppError> {
    let institution = OnboardingService::new(state.store())
        .register_institution(&caller.context, form)
        .await?;
    Ok((StatusCode::CREATED, Json(institution)))
}

/// POST /api/user/update
pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let user = OnboardingService::new(state.store())
        .update_user(&caller.context, update)
        .await?;
    Ok(Json(user))
}
