//! Student bookings with institution therapists.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use calmly_core::{AccessError, BookingId, BookingStatus, InstitutionId, RequestContext, TherapistId};

use crate::db::{BookingStore, TherapistStore};
use crate::error::AppError;
use crate::models::{Booking, NewBooking};

/// Bookings returned by the list endpoint.
pub const BOOKING_LIST_LIMIT: i64 = 50;

/// Body of `POST /api/bookings`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub therapist_id: TherapistId,
    pub appointment_at: DateTime<Utc>,
}

pub struct BookingService<'a, S> {
    store: &'a S,
}

impl<'a, S> BookingService<'a, S>
where
    S: BookingStore + TherapistStore,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Book a session with a therapist of the student's institution.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-students, students without an institution and
    /// therapists of another institution; `Validation` for a past time;
    /// `NotFound` for an unknown therapist.
    #[instrument(skip(self, ctx, request), fields(user_id = %ctx.user_id, therapist_id = %request.therapist_id))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let institution = ctx.require_student()?.ok_or(AccessError::NoInstitution)?;

        if request.appointment_at <= now {
            return Err(AppError::validation("Appointment must be in the future"));
        }

        let therapist = self
            .store
            .find_therapist(request.therapist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Therapist not found"))?;
        if therapist.institution_id != institution {
            return Err(AccessError::OtherInstitution.into());
        }

        let booking = self
            .store
            .create_booking(&NewBooking {
                student_id: ctx.user_id,
                therapist_id: therapist.id,
                appointment_at: request.appointment_at,
            })
            .await?;

        info!(booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    /// The caller's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .store
            .bookings_for_student(ctx.user_id, None, BOOKING_LIST_LIMIT)
            .await?)
    }

    /// Confirm a pending booking at the admin's institution.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller administers `institution`; `NotFound`
    /// when the booking is not at that institution.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn confirm(
        &self,
        ctx: &RequestContext,
        institution: InstitutionId,
        booking: BookingId,
    ) -> Result<Booking, AppError> {
        ctx.require_admin_of(institution)?;

        let existing = self
            .store
            .find_booking(booking)
            .await?
            .filter(|b| b.institution_id == institution)
            .ok_or_else(|| AppError::not_found("Booking not found"))?;

        if existing.status == BookingStatus::Confirmed {
            return Ok(existing);
        }

        let confirmed = self
            .store
            .set_booking_status(existing.id, BookingStatus::Confirmed)
            .await?;
        info!(booking_id = %confirmed.id, "Booking confirmed");
        Ok(confirmed)
    }
}
