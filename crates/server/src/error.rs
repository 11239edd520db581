//! Unified error handling for the Calmly API.
//!
//! Every handler returns `Result<_, AppError>`. Failures are rendered as a
//! JSON `{"error": "..."}` body; server-side failures are captured to Sentry
//! and their details withheld from the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use calmly_core::{AccessError, EmailError, ScoringError};

use crate::db::RepositoryError;
use crate::genai::GenerationError;

#[derive(Debug, Error)]
pub enum AppError {
    /// No session, or the session no longer maps to an account.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Authenticated but not allowed to act on the target.
    #[error("Permission denied: {0}")]
    Forbidden(#[from] AccessError),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The generation endpoint could not be used.
    #[error("External service unavailable: {0}")]
    ExternalService(#[from] GenerationError),

    /// Storage failed.
    #[error("Persistence failure: {0}")]
    Persistence(RepositoryError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::Session(_) | Self::Internal(_)
        )
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Persistence(other),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Validation(format!("Invalid email: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        } else if matches!(self, Self::ExternalService(_)) {
            tracing::warn!(error = %self, "External service failure");
        }

        let message = match &self {
            Self::Persistence(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::ExternalService(_) => "External service unavailable".to_string(),
            _ => self.to_string(),
        };

        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

/// Set the Sentry user context for the current scope.
pub fn set_sentry_user(user_id: calmly_core::UserId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use calmly_core::UserRole;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes_follow_taxonomy() {
        let cases = [
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AppError::Forbidden(AccessError::OtherInstitution),
                StatusCode::FORBIDDEN,
            ),
            (AppError::validation("Missing messages"), StatusCode::BAD_REQUEST),
            (AppError::not_found("Student"), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AppError::ExternalService(GenerationError::EmptyResponse),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_validation_message_reaches_client() {
        let (status, body) = body_of(AppError::validation("Missing messages")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing messages");
    }

    #[tokio::test]
    async fn test_persistence_details_hidden() {
        let err = AppError::from(RepositoryError::DataCorruption("bad row 17".into()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_repository_errors_map_to_client_errors() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("taken".into())),
            AppError::Conflict(m) if m == "taken"
        ));
    }

    #[test]
    fn test_forbidden_display() {
        let err = AppError::from(AccessError::WrongRole(UserRole::InstitutionAdmin));
        assert_eq!(
            err.to_string(),
            "Permission denied: this action requires the INSTITUTION_ADMIN role"
        );
    }
}
