//! User accounts and student profiles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use calmly_core::{Email, InstitutionId, RequestContext, UserId, UserRole};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Option<UserRole>,
    pub institution_id: Option<InstitutionId>,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub consent_given: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The request-scoped view used by authorization checks.
    #[must_use]
    pub const fn context(&self) -> RequestContext {
        RequestContext {
            user_id: self.id,
            role: self.role,
            institution_id: self.institution_id,
        }
    }
}

/// Self-reported student details collected at onboarding.
///
/// Every field is optional; on update `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub student_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub emergency_phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub medical_history: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub current_medications: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub previous_therapy: Option<bool>,
}

/// Fields a user may change about themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile: StudentProfile,
    pub consent_given: Option<bool>,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
}

/// What an institution admin sees about one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for StudentSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            student_id: user.profile.student_id.clone(),
            created_at: user.created_at,
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Accepts `true`, `false`, `"true"`, `"false"` or `"yes"`/`"no"`.
///
/// Onboarding forms post checkbox and select values as strings.
fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(Some(true)),
            "false" | "no" => Ok(Some(false)),
            "" => Ok(None),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got \"{other}\""
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_string_booleans() {
        let profile: StudentProfile =
            serde_json::from_str(r#"{"previousTherapy":"true","gender":"  "}"#).unwrap();
        assert_eq!(profile.previous_therapy, Some(true));
        assert_eq!(profile.gender, None);

        let profile: StudentProfile = serde_json::from_str(r#"{"previousTherapy":false}"#).unwrap();
        assert_eq!(profile.previous_therapy, Some(false));

        assert!(serde_json::from_str::<StudentProfile>(r#"{"previousTherapy":"maybe"}"#).is_err());
    }

    #[test]
    fn test_profile_date_of_birth() {
        let profile: StudentProfile =
            serde_json::from_str(r#"{"dateOfBirth":"2004-08-15","studentId":"CS-21-044"}"#)
                .unwrap();
        assert_eq!(
            profile.date_of_birth,
            NaiveDate::from_ymd_opt(2004, 8, 15)
        );
        assert_eq!(profile.student_id.as_deref(), Some("CS-21-044"));
    }
}
