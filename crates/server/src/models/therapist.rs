//! Therapists attached to an institution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use calmly_core::{Email, InstitutionId, TherapistId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Therapist {
    pub id: TherapistId,
    pub institution_id: InstitutionId,
    pub name: String,
    pub email: Email,
    pub specialties: Vec<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTherapist {
    pub name: String,
    pub email: Email,
    #[serde(default, alias = "specialty")]
    pub specialties: Vec<String>,
    pub phone: Option<String>,
}
