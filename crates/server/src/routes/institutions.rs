//! Institution directory and admin management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use calmly_core::{BookingId, InstitutionId, TherapistId, UserId};

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::{Caller, RequireAuth};
use crate::models::{
    Booking, Institution, InstitutionSettings, InstitutionSummary, NewTherapist, Therapist,
};
use crate::services::institutions::StudentDetails;
use crate::services::{BookingService, InstitutionService, TherapistService};
use crate::state::AppState;

/// GET /api/institutions
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> Result<Json<Vec<InstitutionSummary>>, AppError> {
    Ok(Json(InstitutionService::new(state.store()).list().await?))
}

/// PUT /api/institutions/{id}/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<InstitutionId>,
    caller: Caller,
    JsonBody(settings): JsonBody<InstitutionSettings>,
) -> Result<Json<Institution>, AppError> {
    let institution = InstitutionService::new(state.store())
        .update_settings(&caller.context, id, settings)
        .await?;
    Ok(Json(institution))
}

/// GET /api/institutions/{id}/students/{student_id}
pub async fn student_details(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(InstitutionId, UserId)>,
    caller: Caller,
) -> Result<Json<StudentDetails>, AppError> {
    let details = InstitutionService::new(state.store())
        .student_details(&caller.context, id, student_id)
        .await?;
    Ok(Json(details))
}

/// GET /api/therapists
pub async fn therapists(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Therapist>>, AppError> {
    let therapists = TherapistService::new(state.store())
        .list_for_caller(&caller.context)
        .await?;
    Ok(Json(therapists))
}

/// POST /api/institutions/{id}/therapists
pub async fn add_therapist(
    State(state): State<AppState>,
    Path(id): Path<InstitutionId>,
    caller: Caller,
    JsonBody(therapist): JsonBody<NewTherapist>,
) -> Result<(StatusCode, Json<Therapist>), AppError> {
    let therapist = TherapistService::new(state.store())
        .add(&caller.context, id, therapist)
        .await?;
    Ok((StatusCode::CREATED, Json(therapist)))
}

/// DELETE /api/institutions/{id}/therapists/{therapist_id}
pub async fn remove_therapist(
    State(state): State<AppState>,
    Path((id, therapist_id)): Path<(InstitutionId, TherapistId)>,
    caller: Caller,
) -> Result<StatusCode, AppError> {
    TherapistService::new(state.store())
        .remove(&caller.context, id, therapist_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/institutions/{id}/bookings/{booking_id}/confirm
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path((id, booking_id)): Path<(InstitutionId, BookingId)>,
    caller: Caller,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::new(state.store())
        .confirm(&caller.context, id, booking_id)
        .await?;
    Ok(Json(booking))
}
