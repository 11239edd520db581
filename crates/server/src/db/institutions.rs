//! Institutions.

use std::future::Future;

use chrono::{DateTime, Utc};

use calmly_core::{InstitutionId, UserId, UserRole};

use super::{PgStore, RepositoryError, stored_email};
use crate::models::{Institution, InstitutionSettings, InstitutionSummary, NewInstitution};

pub trait InstitutionStore: Send + Sync {
    /// Create an institution and link `admin` to it in one transaction.
    ///
    /// The admin's role becomes `INSTITUTION_ADMIN` if it was unset.
    ///
    /// # Errors
    /// `Conflict` when the admin is already linked to an institution.
    fn create_for_admin(
        &self,
        admin: UserId,
        institution: &NewInstitution,
    ) -> impl Future<Output = Result<Institution, RepositoryError>> + Send;

    fn find_institution(
        &self,
        id: InstitutionId,
    ) -> impl Future<Output = Result<Option<Institution>, RepositoryError>> + Send;

    /// All institutions, ordered by name.
    fn list_institutions(
        &self,
    ) -> impl Future<Output = Result<Vec<InstitutionSummary>, RepositoryError>> + Send;

    fn update_settings(
        &self,
        id: InstitutionId,
        settings: &InstitutionSettings,
    ) -> impl Future<Output = Result<Institution, RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

pub const ALREADY_LINKED: &str = "You are already associated with an institution.";

const INSTITUTION_COLUMNS: &str = "id, name, email, hod_name, hod_email, hod_phone, \
     total_students, institution_type, address, city, state, website, established, created_at";

#[derive(Debug, sqlx::FromRow)]
struct InstitutionRow {
    id: InstitutionId,
    name: String,
    email: String,
    hod_name: String,
    hod_email: String,
    hod_phone: String,
    total_students: Option<i32>,
    institution_type: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    website: Option<String>,
    established: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InstitutionRow> for Institution {
    type Error = RepositoryError;

    fn try_from(row: InstitutionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: stored_email(&row.email)?,
            hod_name: row.hod_name,
            hod_email: stored_email(&row.hod_email)?,
            hod_phone: row.hod_phone,
            total_students: row.total_students,
            institution_type: row.institution_type,
            address: row.address,
            city: row.city,
            state: row.state,
            website: row.website,
            established: row.established,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: InstitutionId,
    name: String,
}

// =============================================================================
// PostgreSQL
// =============================================================================

impl InstitutionStore for PgStore {
    async fn create_for_admin(
        &self,
        admin: UserId,
        institution: &NewInstitution,
    ) -> Result<Institution, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: InstitutionRow = sqlx::query_as(&format!(
            "INSERT INTO institution \
                (name, email, hod_name, hod_email, hod_phone, total_students, \
                 institution_type, address, city, state, website, established) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {INSTITUTION_COLUMNS}"
        ))
        .bind(&institution.name)
        .bind(institution.email.as_str())
        .bind(&institution.hod_name)
        .bind(institution.hod_email.as_str())
        .bind(&institution.hod_phone)
        .bind(institution.total_students)
        .bind(institution.institution_type.as_deref())
        .bind(institution.address.as_deref())
        .bind(institution.city.as_deref())
        .bind(institution.state.as_deref())
        .bind(institution.website.as_deref())
        .bind(institution.established)
        .fetch_one(&mut *tx)
        .await?;

        let linked = sqlx::query(
            "UPDATE app_user \
             SET institution_id = $2, role = COALESCE(role, $3), updated_at = NOW() \
             WHERE id = $1 AND institution_id IS NULL",
        )
        .bind(admin)
        .bind(row.id)
        .bind(UserRole::InstitutionAdmin)
        .execute(&mut *tx)
        .await?;

        if linked.rows_affected() == 0 {
            // Dropping the transaction rolls back the insert.
            return Err(RepositoryError::Conflict(ALREADY_LINKED.to_string()));
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn find_institution(
        &self,
        id: InstitutionId,
    ) -> Result<Option<Institution>, RepositoryError> {
        let row: Option<InstitutionRow> = sqlx::query_as(&format!(
            "SELECT {INSTITUTION_COLUMNS} FROM institution WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_institutions(&self) -> Result<Vec<InstitutionSummary>, RepositoryError> {
        let rows: Vec<SummaryRow> =
            sqlx::query_as("SELECT id, name FROM institution ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| InstitutionSummary {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn update_settings(
        &self,
        id: InstitutionId,
        settings: &InstitutionSettings,
    ) -> Result<Institution, RepositoryError> {
        let row: Option<InstitutionRow> = sqlx::query_as(&format!(
            "UPDATE institution SET \
                name = $2, email = $3, hod_name = $4, hod_email = $5, hod_phone = $6, \
                website = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {INSTITUTION_COLUMNS}"
        ))
        .bind(id)
        .bind(&settings.name)
        .bind(settings.email.as_str())
        .bind(&settings.hod_name)
        .bind(settings.hod_email.as_str())
        .bind(&settings.hod_phone)
        .bind(settings.website.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
