//! Bookings with therapists.

use std::future::Future;

use chrono::{DateTime, Utc};

use calmly_core::{BookingId, BookingStatus, InstitutionId, TherapistId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{Booking, NewBooking};

pub trait BookingStore: Send + Sync {
    fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> impl Future<Output = Result<Booking, RepositoryError>> + Send;

    fn find_booking(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, RepositoryError>> + Send;

    /// A student's bookings created at or after `since`, newest first.
    fn bookings_for_student(
        &self,
        student_id: UserId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Booking>, RepositoryError>> + Send;

    fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> impl Future<Output = Result<Booking, RepositoryError>> + Send;
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: BookingId,
    student_id: UserId,
    therapist_id: TherapistId,
    therapist_name: String,
    institution_id: InstitutionId,
    appointment_at: DateTime<Utc>,
    status: BookingStatus,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            therapist_id: row.therapist_id,
            therapist_name: row.therapist_name,
            institution_id: row.institution_id,
            appointment_at: row.appointment_at,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Select list over `b` (booking) joined with `t` (therapist).
const BOOKING_SELECT: &str = "SELECT b.id, b.student_id, b.therapist_id, \
     t.name AS therapist_name, t.institution_id, b.appointment_at, b.status, b.created_at";

impl BookingStore for PgStore {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, RepositoryError> {
        let row: BookingRow = sqlx::query_as(&format!(
            "WITH b AS ( \
                INSERT INTO booking (student_id, therapist_id, appointment_at) \
                VALUES ($1, $2, $3) RETURNING * \
             ) \
             {BOOKING_SELECT} FROM b JOIN therapist t ON t.id = b.therapist_id"
        ))
        .bind(booking.student_id)
        .bind(booking.therapist_id)
        .bind(booking.appointment_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "{BOOKING_SELECT} FROM booking b JOIN therapist t ON t.id = b.therapist_id \
             WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn bookings_for_student(
        &self,
        student_id: UserId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "{BOOKING_SELECT} FROM booking b JOIN therapist t ON t.id = b.therapist_id \
             WHERE b.student_id = $1 AND ($2::timestamptz IS NULL OR b.created_at >= $2) \
             ORDER BY b.created_at DESC, b.id DESC \
             LIMIT $3"
        ))
        .bind(student_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "WITH b AS ( \
                UPDATE booking SET status = $2 WHERE id = $1 RETURNING * \
             ) \
             {BOOKING_SELECT} FROM b JOIN therapist t ON t.id = b.therapist_id"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}
