//! First-run onboarding and account settings.
//!
//! A new account has no role. It becomes a student by naming an existing
//! institution, or an institution admin by registering a new one. The
//! role is chosen once.

use serde::Deserialize;
use tracing::{info, instrument};

use calmly_core::{AccessError, InstitutionId, RequestContext, UserRole};

use crate::db::institutions::ALREADY_LINKED;
use crate::db::{InstitutionStore, UserStore};
use crate::error::AppError;
use crate::models::{Institution, NewInstitution, ProfileUpdate, StudentProfile, User};

const ROLE_ALREADY_CHOSEN: &str = "Your role has already been chosen.";

/// Body of `POST /api/onboarding/role`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSelection {
    pub role: UserRole,
    pub institution_id: Option<InstitutionId>,
}

/// Body of `POST /api/onboarding/student`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOnboarding {
    pub institution_id: Option<InstitutionId>,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub consent_given: Option<bool>,
}

/// Body of `POST /api/user/update`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub role: Option<UserRole>,
    pub institution_id: Option<InstitutionId>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub consent_given: Option<bool>,
}

pub struct OnboardingService<'a, S> {
    store: &'a S,
}

impl<'a, S> OnboardingService<'a, S>
where
    S: UserStore + InstitutionStore,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Pick a role. Students must name an institution.
    ///
    /// Re-selecting the current role is accepted; switching is not.
    ///
    /// # Errors
    ///
    /// `Validation` when a student names no institution, `NotFound` when it
    /// does not exist, `Conflict` when a different role is already set.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn choose_role(
        &self,
        ctx: &RequestContext,
        selection: RoleSelection,
    ) -> Result<User, AppError> {
        ensure_role_unset_or(ctx, selection.role)?;

        let institution = match selection.role {
            UserRole::Student => {
                let id = selection
                    .institution_id
                    .ok_or_else(|| AppError::validation("Please select your institution."))?;
                Some(self.existing_institution(id).await?)
            }
            UserRole::InstitutionAdmin => None,
        };

        if let Some(institution) = institution {
            self.store.link_institution(ctx.user_id, institution).await?;
        }
        self.assign_role(ctx, selection.role).await?;

        info!(role = %selection.role, "Role chosen");
        self.reload(ctx).await
    }

    /// Complete the student profile form.
    ///
    /// # Errors
    ///
    /// `Forbidden` for institution admins, `Validation` when no institution
    /// is named, `Conflict` when already linked to a different institution.
    #[instrument(skip(self, ctx, form), fields(user_id = %ctx.user_id))]
    pub async fn complete_student(
        &self,
        ctx: &RequestContext,
        form: StudentOnboarding,
    ) -> Result<User, AppError> {
        if ctx.role == Some(UserRole::InstitutionAdmin) {
            return Err(AccessError::WrongRole(UserRole::Student).into());
        }

        let institution_id = form
            .institution_id
            .ok_or_else(|| AppError::validation("Institution is a required field."))?;
        let institution_id = self.existing_institution(institution_id).await?;

        match ctx.institution_id {
            Some(current) if current != institution_id => {
                return Err(AppError::Conflict(ALREADY_LINKED.to_string()));
            }
            Some(_) => {}
            None => {
                self.store.link_institution(ctx.user_id, institution_id).await?;
            }
        }
        self.assign_role(ctx, UserRole::Student).await?;

        let user = self
            .store
            .update_profile(
                ctx.user_id,
                &ProfileUpdate {
                    name: None,
                    profile: form.profile,
                    consent_given: form.consent_given,
                },
            )
            .await?;

        info!(institution_id = %institution_id, "Student onboarding completed");
        Ok(user)
    }

    /// Register a new institution with the caller as its admin.
    ///
    /// # Errors
    ///
    /// `Forbidden` for students, `Validation` for blank required fields,
    /// `Conflict` when the caller already belongs to an institution.
    #[instrument(skip(self, ctx, institution), fields(user_id = %ctx.user_id))]
    pub async fn register_institution(
        &self,
        ctx: &RequestContext,
        institution: NewInstitution,
    ) -> Result<Institution, AppError> {
        ensure_role_unset_or(ctx, UserRole::InstitutionAdmin).map_err(|_| {
            AppError::Forbidden(AccessError::WrongRole(UserRole::InstitutionAdmin))
        })?;
        if ctx.institution_id.is_some() {
            return Err(AppError::Conflict(ALREADY_LINKED.to_string()));
        }
        validate_institution(&institution)?;

        let created = self.store.create_for_admin(ctx.user_id, &institution).await?;

        info!(institution_id = %created.id, "Institution registered");
        Ok(created)
    }

    /// Settings page update.
    ///
    /// A role is accepted only while none is set. An institution is linked
    /// only for students without one; admins get theirs by registering.
    ///
    /// # Errors
    ///
    /// `Conflict` on a role switch, `Validation` for a student role without
    /// an institution or a blank name, `NotFound` for an unknown institution.
    #[instrument(skip(self, ctx, update), fields(user_id = %ctx.user_id))]
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        update: UserUpdate,
    ) -> Result<User, AppError> {
        let name = match update.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("Name cannot be empty")),
            other => other.map(str::to_string),
        };

        let institution = match update.institution_id {
            Some(id) => Some(self.existing_institution(id).await?),
            None => None,
        };

        let role = match update.role {
            Some(role) => {
                ensure_role_unset_or(ctx, role)?;
                if role == UserRole::Student && institution.is_none() && ctx.institution_id.is_none()
                {
                    return Err(AppError::validation("Please select your institution."));
                }
                self.assign_role(ctx, role).await?;
                Some(role)
            }
            None => ctx.role,
        };

        if let (Some(id), None, Some(UserRole::Student)) = (institution, ctx.institution_id, role) {
            self.store.link_institution(ctx.user_id, id).await?;
        }

        let user = self
            .store
            .update_profile(
                ctx.user_id,
                &ProfileUpdate {
                    name,
                    profile: update.profile,
                    consent_given: update.consent_given,
                },
            )
            .await?;

        Ok(user)
    }

    async fn existing_institution(&self, id: InstitutionId) -> Result<InstitutionId, AppError> {
        self.store
            .find_institution(id)
            .await?
            .map(|i| i.id)
            .ok_or_else(|| AppError::not_found("Institution not found"))
    }

    /// Set the role, tolerating a concurrent request that set the same one.
    async fn assign_role(&self, ctx: &RequestContext, role: UserRole) -> Result<(), AppError> {
        if ctx.role.is_some() || self.store.assign_role(ctx.user_id, role).await? {
            return Ok(());
        }
        match self.reload(ctx).await?.role {
            Some(current) if current == role => Ok(()),
            _ => Err(AppError::Conflict(ROLE_ALREADY_CHOSEN.to_string())),
        }
    }

    async fn reload(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.store
            .find_user(ctx.user_id)
            .await?
            .ok_or(AppError::Unauthenticated)
    }
}

fn ensure_role_unset_or(ctx: &RequestContext, role: UserRole) -> Result<(), AppError> {
    match ctx.role {
        Some(current) if current != role => {
            Err(AppError::Conflict(ROLE_ALREADY_CHOSEN.to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_institution(institution: &NewInstitution) -> Result<(), AppError> {
    let required = [
        ("Institution name", &institution.name),
        ("HOD name", &institution.hod_name),
        ("HOD phone", &institution.hod_phone),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!("{field} is required")));
        }
    }
    if institution.total_students.is_some_and(|n| n < 0) {
        return Err(AppError::validation("Total students cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use calmly_core::UserId;

    use super::*;

    fn ctx(role: Option<UserRole>) -> RequestContext {
        RequestContext {
            user_id: UserId::new(1),
            role,
            institution_id: None,
        }
    }

    #[test]
    fn test_role_is_chosen_once() {
        assert!(ensure_role_unset_or(&ctx(None), UserRole::Student).is_ok());
        assert!(ensure_role_unset_or(&ctx(Some(UserRole::Student)), UserRole::Student).is_ok());
        assert!(matches!(
            ensure_role_unset_or(&ctx(Some(UserRole::Student)), UserRole::InstitutionAdmin),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_student_form_accepts_string_flags() {
        let form: StudentOnboarding = serde_json::from_str(
            r#"{"institutionId":3,"studentId":"CS-21","previousTherapy":"true","consentGiven":true}"#,
        )
        .unwrap();

        assert_eq!(form.institution_id, Some(InstitutionId::new(3)));
        assert_eq!(form.profile.student_id.as_deref(), Some("CS-21"));
        assert_eq!(form.profile.previous_therapy, Some(true));
        assert_eq!(form.consent_given, Some(true));
    }

    #[test]
    fn test_institution_form_requires_names() {
        let institution: NewInstitution = serde_json::from_str(
            r#"{"institutionName":" ","email":"a@b.in","hodName":"Dr Rao",
                "hodEmail":"rao@b.in","hodPhone":"98"}"#,
        )
        .unwrap();
        assert!(matches!(
            validate_institution(&institution),
            Err(AppError::Validation(m)) if m == "Institution name is required"
        ));
    }
}
