//! Provider error types

use thiserror::Error;

/// Errors raised while talking to a remote provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request could not be built or sent (DNS, TLS, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a status other than success or auth failure
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Base URL could not be used
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}
