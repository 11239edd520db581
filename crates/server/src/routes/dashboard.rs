//! Dashboard and analytics handlers.

use axum::{Json, extract::State};
use chrono::Utc;

use calmly_core::analytics::InstitutionAnalytics;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::services::dashboard::{InstitutionDashboard, StudentDashboard};
use crate::services::{AnalyticsService, DashboardService};
use crate::state::AppState;

/// GET /api/dashboard/student
pub async fn student(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<StudentDashboard>, AppError> {
    let dashboard = DashboardService::new(state.store())
        .student(caller.user, Utc::now())
        .await?;
    Ok(Json(dashboard))
}

/// GET /api/dashboard/institution
pub async fn institution(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<InstitutionDashboard>, AppError> {
    let dashboard = DashboardService::new(state.store())
        .institution(&caller.context)
        .await?;
    Ok(Json(dashboard))
}

/// GET /api/analytics
pub async fn analytics(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<InstitutionAnalytics>, AppError> {
    let analytics = AnalyticsService::new(state.store())
        .for_caller(&caller.context)
        .await?;
    Ok(Json(analytics))
}
