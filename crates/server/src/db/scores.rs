//! PHQ-9 / GAD-7 submissions.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use calmly_core::analytics::ScoreRecord;
use calmly_core::{Instrument, InstitutionId, Responses, ScoreId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewScore, StoredScore};

pub trait ScoreStore: Send + Sync {
    fn insert_score(
        &self,
        score: &NewScore,
    ) -> impl Future<Output = Result<StoredScore, RepositoryError>> + Send;

    /// Newest first, at most `limit`.
    fn recent_scores(
        &self,
        user_id: UserId,
        instrument: Instrument,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<StoredScore>, RepositoryError>> + Send;

    /// Every score of one user, oldest first.
    fn score_history(
        &self,
        user_id: UserId,
        instrument: Instrument,
    ) -> impl Future<Output = Result<Vec<StoredScore>, RepositoryError>> + Send;

    /// Scores of all users currently linked to the institution.
    fn institution_scores(
        &self,
        institution_id: InstitutionId,
        instrument: Instrument,
    ) -> impl Future<Output = Result<Vec<ScoreRecord>, RepositoryError>> + Send;
}

#[derive(Debug, sqlx::FromRow)]
struct ScoreRow {
    id: ScoreId,
    user_id: UserId,
    instrument: Instrument,
    score: i32,
    severity: String,
    responses: Json<Responses>,
    created_at: DateTime<Utc>,
}

impl From<ScoreRow> for StoredScore {
    fn from(row: ScoreRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            instrument: row.instrument,
            score: row.score,
            severity: row.severity,
            responses: row.responses.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    score: i32,
    severity: String,
    created_at: DateTime<Utc>,
}

const SCORE_COLUMNS: &str = "id, user_id, instrument, score, severity, responses, created_at";

impl ScoreStore for PgStore {
    async fn insert_score(&self, score: &NewScore) -> Result<StoredScore, RepositoryError> {
        let row: ScoreRow = sqlx::query_as(&format!(
            "INSERT INTO assessment_score (user_id, instrument, score, severity, responses) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SCORE_COLUMNS}"
        ))
        .bind(score.user_id)
        .bind(score.instrument)
        .bind(score.score)
        .bind(&score.severity)
        .bind(Json(&score.responses))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn recent_scores(
        &self,
        user_id: UserId,
        instrument: Instrument,
        limit: i64,
    ) -> Result<Vec<StoredScore>, RepositoryError> {
        let rows: Vec<ScoreRow> = sqlx::query_as(&format!(
            "SELECT {SCORE_COLUMNS} FROM assessment_score \
             WHERE user_id = $1 AND instrument = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        ))
        .bind(user_id)
        .bind(instrument)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn score_history(
        &self,
        user_id: UserId,
        instrument: Instrument,
    ) -> Result<Vec<StoredScore>, RepositoryError> {
        let rows: Vec<ScoreRow> = sqlx::query_as(&format!(
            "SELECT {SCORE_COLUMNS} FROM assessment_score \
             WHERE user_id = $1 AND instrument = $2 \
             ORDER BY created_at, id"
        ))
        .bind(user_id)
        .bind(instrument)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn institution_scores(
        &self,
        institution_id: InstitutionId,
        instrument: Instrument,
    ) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT s.score, s.severity, s.created_at \
             FROM assessment_score s JOIN app_user u ON u.id = s.user_id \
             WHERE u.institution_id = $1 AND s.instrument = $2 \
             ORDER BY s.created_at",
        )
        .bind(institution_id)
        .bind(instrument)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ScoreRecord {
                score: r.score,
                severity: r.severity,
                recorded_at: r.created_at,
            })
            .collect())
    }
}
