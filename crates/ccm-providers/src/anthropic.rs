//! Anthropic API credential validation

use crate::{KeyStatus, KeyValidator, ProviderError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Canonical remote endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by the API on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// HTTP client for the Anthropic API
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl AnthropicClient {
    /// Create a client with the default request timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    fn models_url(base_url: Option<&str>) -> Result<String, ProviderError> {
        let base = base_url
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::InvalidUrl(base.to_string()));
        }

        Ok(format!("{base}/v1/models"))
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValidator for AnthropicClient {
    async fn validate_key(
        &self,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<KeyStatus, ProviderError> {
        let url = Self::models_url(base_url)?;
        tracing::debug!(%url, "validating credential");

        let response = self
            .http
            .get(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(KeyStatus::Valid);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(KeyStatus::Invalid);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
