//! Persisted questionnaire results.

use chrono::{DateTime, Utc};
use serde::Serialize;

use calmly_core::analytics::ScoreRecord;
use calmly_core::{Instrument, Responses, ScoreId, UserId};

/// One submitted PHQ-9 or GAD-7. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScore {
    pub id: ScoreId,
    pub user_id: UserId,
    pub instrument: Instrument,
    pub score: i32,
    pub severity: String,
    pub responses: Responses,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub user_id: UserId,
    pub instrument: Instrument,
    pub score: i32,
    pub severity: String,
    pub responses: Responses,
}

impl From<&StoredScore> for ScoreRecord {
    fn from(score: &StoredScore) -> Self {
        Self {
            score: score.score,
            severity: score.severity.clone(),
            recorded_at: score.created_at,
        }
    }
}
