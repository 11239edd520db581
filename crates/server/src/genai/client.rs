//! Generative Language API client.
//!
//! One non-streaming `generateContent` call per chat turn. The API key
//! travels as the `key` query parameter.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use crate::config::GeminiConfig;

use super::TextGenerator;
use super::error::{ApiErrorResponse, GenerationError};
use super::types::{GenerateRequest, GenerateResponse};

const GENERATIVE_LANGUAGE_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Generative Language API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// A client without an API key is valid; every call then fails with
    /// [`GenerationError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                model: config.model.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    #[instrument(skip(self, prompt), fields(model = %self.inner.model, prompt_len = prompt.len()))]
    async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(GenerationError::NotConfigured)?;
        let endpoint = endpoint_url(&self.inner.model, api_key)?;

        let response = self
            .inner
            .client
            .post(endpoint)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Parse(format!("Failed to parse response: {e}")))?;

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_content(prompt).await
    }
}

/// `{base}models/{model}:generateContent?key=...`
fn endpoint_url(model: &str, api_key: &SecretString) -> Result<Url, GenerationError> {
    let mut url = Url::parse(GENERATIVE_LANGUAGE_API_URL)
        .and_then(|base| base.join(&format!("models/{model}:generateContent")))
        .map_err(|e| GenerationError::Parse(format!("Invalid endpoint for model {model}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("key", api_key.expose_secret());
    Ok(url)
}

async fn handle_error_status(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> GenerationError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return GenerationError::RateLimited(retry_after);
    }

    if matches!(
        status,
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
    ) {
        return GenerationError::Unauthorized("API key rejected".to_string());
    }

    match response.text().await {
        Ok(body) => {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |api_error| api_error.error.message);
            GenerationError::Api {
                status: status.as_u16(),
                message,
            }
        }
        Err(e) => GenerationError::Http(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("gemini-1.5-flash", &SecretString::from("k3y")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=k3y"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(&GeminiConfig::default()).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.generate("hello").await,
            Err(GenerationError::NotConfigured)
        ));
    }

    #[test]
    fn test_gemini_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<GeminiClient>();
    }
}
