//! Therapist roster management.

use tracing::{info, instrument};

use calmly_core::{InstitutionId, RequestContext, TherapistId};

use crate::db::TherapistStore;
use crate::error::AppError;
use crate::models::{NewTherapist, Therapist};

pub struct TherapistService<'a, S> {
    therapists: &'a S,
}

impl<'a, S: TherapistStore> TherapistService<'a, S> {
    #[must_use]
    pub const fn new(therapists: &'a S) -> Self {
        Self { therapists }
    }

    /// Therapists of the caller's own institution.
    ///
    /// # Errors
    ///
    /// `Forbidden` when the caller has no institution.
    pub async fn list_for_caller(&self, ctx: &RequestContext) -> Result<Vec<Therapist>, AppError> {
        let institution = ctx.institution()?;
        Ok(self.therapists.list_therapists(institution).await?)
    }

    /// # Errors
    ///
    /// `Forbidden` unless the caller administers `institution`, `Validation`
    /// for a blank name, `Conflict` for a duplicate e-mail.
    #[instrument(skip(self, ctx, therapist), fields(user_id = %ctx.user_id, institution_id = %institution))]
    pub async fn add(
        &self,
        ctx: &RequestContext,
        institution: InstitutionId,
        mut therapist: NewTherapist,
    ) -> Result<Therapist, AppError> {
        ctx.require_admin_of(institution)?;

        therapist.name = therapist.name.trim().to_string();
        if therapist.name.is_empty() {
            return Err(AppError::validation("Therapist name is required"));
        }
        therapist.specialties = therapist
            .specialties
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let created = self.therapists.add_therapist(institution, &therapist).await?;
        info!(therapist_id = %created.id, "Therapist added");
        Ok(created)
    }

    /// Remove a therapist of `institution`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the caller administers `institution`; `NotFound`
    /// when the therapist does not belong to it.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn remove(
        &self,
        ctx: &RequestContext,
        institution: InstitutionId,
        therapist: TherapistId,
    ) -> Result<(), AppError> {
        ctx.require_admin_of(institution)?;

        if !self.therapists.delete_therapist(institution, therapist).await? {
            return Err(AppError::not_found("Therapist not found"));
        }

        info!("Therapist removed");
        Ok(())
    }
}
