//! Accounts, roles and student profiles.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};

use calmly_core::{Email, InstitutionId, UserId, UserRole};

use super::{PgStore, RepositoryError, stored_email};
use crate::models::{NewUser, ProfileUpdate, StudentProfile, User};

pub trait UserStore: Send + Sync {
    /// # Errors
    /// `Conflict` when the e-mail is already registered.
    fn create_user(&self, user: NewUser)
    -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn find_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// The account and its password hash, for sign-in.
    fn find_credentials(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Set the role if none is set yet. Returns whether a row changed.
    fn assign_role(
        &self,
        id: UserId,
        role: UserRole,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Link an institution if none is linked yet. Returns whether a row changed.
    fn link_institution(
        &self,
        id: UserId,
        institution_id: InstitutionId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Apply the non-`None` fields of `update`.
    fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Students of an institution, by name.
    fn list_students(
        &self,
        institution_id: InstitutionId,
    ) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const USER_COLUMNS: &str = "id, email, name, role, institution_id, student_id, date_of_birth, \
     gender, phone_number, emergency_contact, emergency_phone, medical_history, \
     current_medications, previous_therapy, consent_given, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    name: String,
    role: Option<UserRole>,
    institution_id: Option<InstitutionId>,
    student_id: Option<String>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    phone_number: Option<String>,
    emergency_contact: Option<String>,
    emergency_phone: Option<String>,
    medical_history: Option<String>,
    current_medications: Option<String>,
    previous_therapy: Option<bool>,
    consent_given: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: stored_email(&row.email)?,
            name: row.name,
            role: row.role,
            institution_id: row.institution_id,
            profile: StudentProfile {
                student_id: row.student_id,
                date_of_birth: row.date_of_birth,
                gender: row.gender,
                phone_number: row.phone_number,
                emergency_contact: row.emergency_contact,
                emergency_phone: row.emergency_phone,
                medical_history: row.medical_history,
                current_medications: row.current_medications,
                previous_therapy: row.previous_therapy,
            },
            consent_given: row.consent_given,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// PostgreSQL
// =============================================================================

impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO app_user (email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::conflict_on_unique(e, "An account with this email already exists.")
        })?;

        row.try_into()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM app_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn assign_role(&self, id: UserId, role: UserRole) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE app_user SET role = $2, updated_at = NOW() WHERE id = $1 AND role IS NULL",
        )
        .bind(id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_institution(
        &self,
        id: UserId,
        institution_id: InstitutionId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE app_user SET institution_id = $2, updated_at = NOW() \
             WHERE id = $1 AND institution_id IS NULL",
        )
        .bind(id)
        .bind(institution_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let profile = &update.profile;
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE app_user SET \
                name = COALESCE($2, name), \
                student_id = COALESCE($3, student_id), \
                date_of_birth = COALESCE($4, date_of_birth), \
                gender = COALESCE($5, gender), \
                phone_number = COALESCE($6, phone_number), \
                emergency_contact = COALESCE($7, emergency_contact), \
                emergency_phone = COALESCE($8, emergency_phone), \
                medical_history = COALESCE($9, medical_history), \
                current_medications = COALESCE($10, current_medications), \
                previous_therapy = COALESCE($11, previous_therapy), \
                consent_given = COALESCE($12, consent_given), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(profile.student_id.as_deref())
        .bind(profile.date_of_birth)
        .bind(profile.gender.as_deref())
        .bind(profile.phone_number.as_deref())
        .bind(profile.emergency_contact.as_deref())
        .bind(profile.emergency_phone.as_deref())
        .bind(profile.medical_history.as_deref())
        .bind(profile.current_medications.as_deref())
        .bind(profile.previous_therapy)
        .bind(update.consent_given)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn list_students(
        &self,
        institution_id: InstitutionId,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM app_user \
             WHERE institution_id = $1 AND role = 'STUDENT' \
             ORDER BY name, id"
        ))
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
