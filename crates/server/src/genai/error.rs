//! Error types for the generation client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when requesting a completion.
///
/// None of these reach a chat user: the orchestrator logs them and answers
/// with a fallback reply instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key configured.
    #[error("generation API key is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// A well-formed response that carried no text.
    #[error("response contained no text")]
    EmptyResponse,

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// True when the endpoint was reached and refused the request, as
    /// opposed to the request never completing.
    #[must_use]
    pub const fn is_api_refusal(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::RateLimited(_) | Self::Unauthorized(_)
        )
    }
}

/// Error body returned by the Generative Language API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::Api {
            status: 400,
            message: "API key not valid".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): API key not valid");
        assert_eq!(
            GenerationError::Timeout(Duration::from_secs(15)).to_string(),
            "no response within 15s"
        );
    }

    #[test]
    fn test_api_refusal_classification() {
        assert!(GenerationError::RateLimited(30).is_api_refusal());
        assert!(!GenerationError::EmptyResponse.is_api_refusal());
        assert!(!GenerationError::NotConfigured.is_api_refusal());
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.code, 400);
        assert_eq!(response.error.status, "INVALID_ARGUMENT");
        assert!(response.error.message.starts_with("API key not valid"));
    }
}
