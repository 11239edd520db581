//! Role and status enums shared by the server and CLI.

use serde::{Deserialize, Serialize};

/// The role a user picks during onboarding.
///
/// A freshly registered user has no role (`Option<UserRole>::None`) until
/// they choose one; the choice is made once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// A student taking screenings, chatting and booking sessions.
    Student,
    /// Staff managing one institution's therapists and analytics.
    InstitutionAdmin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "STUDENT"),
            Self::InstitutionAdmin => write!(f, "INSTITUTION_ADMIN"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "INSTITUTION_ADMIN" => Ok(Self::InstitutionAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Therapist booking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
}

/// Tag carried by every chat transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Normal,
    Crisis,
    Screening,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Student, UserRole::InstitutionAdmin] {
            assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
        }
        assert!("ADMIN".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::InstitutionAdmin).unwrap(),
            "\"INSTITUTION_ADMIN\""
        );
    }

    #[test]
    fn test_message_kind_defaults_to_normal() {
        assert_eq!(MessageKind::default(), MessageKind::Normal);
        assert_eq!(serde_json::to_string(&MessageKind::Crisis).unwrap(), "\"crisis\"");
    }
}
