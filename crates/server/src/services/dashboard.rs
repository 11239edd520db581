//! Landing-page aggregates for students and institution admins.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::instrument;

use calmly_core::{Instrument, RequestContext};

use crate::db::{
    BookingStore, ChatHistoryStore, InstitutionStore, ScoreStore, TherapistStore, UserStore,
};
use crate::error::AppError;
use crate::models::{Booking, Institution, StoredScore, StudentSummary, Therapist, User};
use crate::services::assessments::RECENT_SCORE_LIMIT;

/// How far back the student dashboard looks for bookings.
const RECENT_BOOKING_DAYS: i64 = 30;
const RECENT_BOOKING_LIMIT: i64 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub user: User,
    pub institution: Option<Institution>,
    /// Newest first.
    pub phq9_scores: Vec<StoredScore>,
    pub gad7_scores: Vec<StoredScore>,
    pub recent_bookings: Vec<Booking>,
    pub has_chat_history: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionDashboard {
    pub institution: Institution,
    pub students: Vec<StudentSummary>,
    pub therapists: Vec<Therapist>,
}

pub struct DashboardService<'a, S> {
    store: &'a S,
}

impl<'a, S> DashboardService<'a, S>
where
    S: UserStore + InstitutionStore + ScoreStore + BookingStore + TherapistStore + ChatHistoryStore,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// `Forbidden` unless the caller is a student.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn student(&self, user: User, now: DateTime<Utc>) -> Result<StudentDashboard, AppError> {
        let ctx: RequestContext = user.context();
        let institution_id = ctx.require_student()?;

        let institution = match institution_id {
            Some(id) => self.store.find_institution(id).await?,
            None => None,
        };

        let phq9_scores = self
            .store
            .recent_scores(user.id, Instrument::Phq9, RECENT_SCORE_LIMIT)
            .await?;
        let gad7_scores = self
            .store
            .recent_scores(user.id, Instrument::Gad7, RECENT_SCORE_LIMIT)
            .await?;

        let since = now - Duration::days(RECENT_BOOKING_DAYS);
        let recent_bookings = self
            .store
            .bookings_for_student(user.id, Some(since), RECENT_BOOKING_LIMIT)
            .await?;

        let has_chat_history = !self.store.load_history(user.id).await?.is_empty();

        Ok(StudentDashboard {
            user,
            institution,
            phq9_scores,
            gad7_scores,
            recent_bookings,
            has_chat_history,
        })
    }

    /// # Errors
    ///
    /// `Forbidden` unless the caller is an admin linked to an institution.
    #[instrument(skip_all, fields(user_id = %ctx.user_id))]
    pub async fn institution(&self, ctx: &RequestContext) -> Result<InstitutionDashboard, AppError> {
        let id = ctx.require_admin()?;

        let institution = self
            .store
            .find_institution(id)
            .await?
            .ok_or_else(|| AppError::not_found("Institution not found"))?;

        let students = self
            .store
            .list_students(id)
            .await?
            .iter()
            .map(StudentSummary::from)
            .collect();
        let therapists = self.store.list_therapists(id).await?;

        Ok(InstitutionDashboard {
            institution,
            students,
            therapists,
        })
    }
}
