//! Student booking handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::Booking;
use crate::services::BookingService;
use crate::services::bookings::BookingRequest;
use crate::state::AppState;

/// GET /api/bookings
pub async fn index(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(
        BookingService::new(state.store())
            .list(&caller.context)
            .await?,
    ))
}

/// POST /api/bookings
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = BookingService::new(state.store())
        .create(&caller.context, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
