//! Counselling session bookings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use calmly_core::{BookingId, BookingStatus, InstitutionId, TherapistId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub student_id: UserId,
    pub therapist_id: TherapistId,
    pub therapist_name: String,
    /// Institution of the therapist, used for admin scoping.
    pub institution_id: InstitutionId,
    pub appointment_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub student_id: UserId,
    pub therapist_id: TherapistId,
    pub appointment_at: DateTime<Utc>,
}
