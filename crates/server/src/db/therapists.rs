//! Therapists.

use std::future::Future;

use chrono::{DateTime, Utc};

use calmly_core::{InstitutionId, TherapistId};

use super::{PgStore, RepositoryError, stored_email};
use crate::models::{NewTherapist, Therapist};

pub trait TherapistStore: Send + Sync {
    /// # Errors
    /// `Conflict` when another therapist already uses the e-mail.
    fn add_therapist(
        &self,
        institution_id: InstitutionId,
        therapist: &NewTherapist,
    ) -> impl Future<Output = Result<Therapist, RepositoryError>> + Send;

    fn find_therapist(
        &self,
        id: TherapistId,
    ) -> impl Future<Output = Result<Option<Therapist>, RepositoryError>> + Send;

    /// Therapists of an institution, by name.
    fn list_therapists(
        &self,
        institution_id: InstitutionId,
    ) -> impl Future<Output = Result<Vec<Therapist>, RepositoryError>> + Send;

    /// Delete a therapist only if it belongs to `institution_id`.
    /// Returns whether a row was removed.
    fn delete_therapist(
        &self,
        institution_id: InstitutionId,
        id: TherapistId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

pub const DUPLICATE_THERAPIST: &str = "A therapist with this email already exists.";

#[derive(Debug, sqlx::FromRow)]
struct TherapistRow {
    id: TherapistId,
    institution_id: InstitutionId,
    name: String,
    email: String,
    specialties: Vec<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TherapistRow> for Therapist {
    type Error = RepositoryError;

    fn try_from(row: TherapistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            institution_id: row.institution_id,
            name: row.name,
            email: stored_email(&row.email)?,
            specialties: row.specialties,
            phone: row.phone,
            created_at: row.created_at,
        })
    }
}

const THERAPIST_COLUMNS: &str = "id, institution_id, name, email, specialties, phone, created_at";

impl TherapistStore for PgStore {
    async fn add_therapist(
        &self,
        institution_id: InstitutionId,
        therapist: &NewTherapist,
    ) -> Result<Therapist, RepositoryError> {
        let row: TherapistRow = sqlx::query_as(&format!(
            "INSERT INTO therapist (institution_id, name, email, specialties, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {THERAPIST_COLUMNS}"
        ))
        .bind(institution_id)
        .bind(&therapist.name)
        .bind(therapist.email.as_str())
        .bind(&therapist.specialties)
        .bind(therapist.phone.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, DUPLICATE_THERAPIST))?;

        row.try_into()
    }

    async fn find_therapist(&self, id: TherapistId) -> Result<Option<Therapist>, RepositoryError> {
        let row: Option<TherapistRow> = sqlx::query_as(&format!(
            "SELECT {THERAPIST_COLUMNS} FROM therapist WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_therapists(
        &self,
        institution_id: InstitutionId,
    ) -> Result<Vec<Therapist>, RepositoryError> {
        let rows: Vec<TherapistRow> = sqlx::query_as(&format!(
            "SELECT {THERAPIST_COLUMNS} FROM therapist WHERE institution_id = $1 ORDER BY name, id"
        ))
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_therapist(
        &self,
        institution_id: InstitutionId,
        id: TherapistId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM therapist WHERE id = $1 AND institution_id = $2")
            .bind(id)
            .bind(institution_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
