//! Institutions and their settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use calmly_core::{Email, InstitutionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    pub email: Email,
    pub hod_name: String,
    pub hod_email: Email,
    pub hod_phone: String,
    pub total_students: Option<i32>,
    pub institution_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    pub established: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Registration form submitted by an admin during onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstitution {
    #[serde(alias = "institutionName")]
    pub name: String,
    pub email: Email,
    pub hod_name: String,
    pub hod_email: Email,
    pub hod_phone: String,
    pub total_students: Option<i32>,
    pub institution_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    pub established: Option<i32>,
}

/// The contact details an admin may edit after onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionSettings {
    pub name: String,
    pub email: Email,
    pub hod_name: String,
    pub hod_email: Email,
    pub hod_phone: String,
    pub website: Option<String>,
}

/// Entry in the public institution picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionSummary {
    pub id: InstitutionId,
    pub name: String,
}
