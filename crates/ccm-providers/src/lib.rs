//! CCM Providers - Remote provider integrations
//!
//! Live credential validation against the Anthropic API. The core engine
//! uses this crate for connection tests when a privileged backend is active.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod anthropic;
mod error;

use async_trait::async_trait;

pub use anthropic::{AnthropicClient, ANTHROPIC_VERSION, DEFAULT_BASE_URL};
pub use error::ProviderError;

/// Outcome of a credential check that reached the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// The endpoint accepted the credential
    Valid,
    /// The endpoint rejected the credential (401/403)
    Invalid,
}

impl KeyStatus {
    /// Whether the credential was accepted
    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A remote service able to validate an API credential
#[async_trait]
pub trait KeyValidator: Send + Sync {
    /// Perform a live round-trip with the given credential
    ///
    /// `base_url` overrides the provider's default endpoint.
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot be reached or answers with
    /// an unexpected status.
    async fn validate_key(
        &self,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<KeyStatus, ProviderError>;
}
