//! Institution directory, settings and per-student views for admins.

use serde::Serialize;
use tracing::{info, instrument};

use calmly_core::{Instrument, InstitutionId, RequestContext, UserId, UserRole};

use crate::db::{InstitutionStore, ScoreStore, UserStore};
use crate::error::AppError;
use crate::models::{Institution, InstitutionSettings, InstitutionSummary, StoredScore, StudentSummary};

/// What an admin sees when opening one student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub student: StudentSummary,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    /// Oldest first, for charting.
    pub phq9_history: Vec<StoredScore>,
    pub gad7_history: Vec<StoredScore>,
}

pub struct InstitutionService<'a, S> {
    store: &'a S,
}

impl<'a, S> InstitutionService<'a, S>
where
    S: InstitutionStore + UserStore + ScoreStore,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every institution by name; used by the student onboarding picker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    pub async fn list(&self) -> Result<Vec<InstitutionSummary>, AppError> {
        Ok(self.store.list_institutions().await?)
    }

    /// # Errors
    ///
    /// `Forbidden` unless the caller administers `id`; `Validation` for
    /// blank required fields.
    #[instrument(skip(self, ctx, settings), fields(user_id = %ctx.user_id, institution_id = %id))]
    pub async fn update_settings(
        &self,
        ctx: &RequestContext,
        id: InstitutionId,
        settings: InstitutionSettings,
    ) -> Result<Institution, AppError> {
        ctx.require_admin_of(id)?;

        for (field, value) in [
            ("Institution name", &settings.name),
            ("HOD name", &settings.hod_name),
            ("HOD phone", &settings.hod_phone),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} is required")));
            }
        }

        let updated = self.store.update_settings(id, &settings).await?;
        info!("Institution settings updated");
        Ok(updated)
    }

    /// Contact details and full score history of one student.
    ///
    /// A student of another institution is reported as not found.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller administers `id`; `NotFound` when the
    /// student is not one of its students.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn student_details(
        &self,
        ctx: &RequestContext,
        id: InstitutionId,
        student_id: UserId,
    ) -> Result<StudentDetails, AppError> {
        ctx.require_admin_of(id)?;

        let student = self
            .store
            .find_user(student_id)
            .await?
            .filter(|u| u.role == Some(UserRole::Student) && u.institution_id == Some(id))
            .ok_or_else(|| AppError::not_found("Student not found"))?;

        let phq9_history = self.store.score_history(student.id, Instrument::Phq9).await?;
        let gad7_history = self.store.score_history(student.id, Instrument::Gad7).await?;

        Ok(StudentDetails {
            student: StudentSummary::from(&student),
            emergency_contact: student.profile.emergency_contact,
            emergency_phone: student.profile.emergency_phone,
            phq9_history,
            gad7_history,
        })
    }
}
