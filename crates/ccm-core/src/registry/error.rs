//! Error types for registry operations

use crate::backend::BackendError;
use thiserror::Error;

/// Errors propagated by user-initiated registry actions
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Gateway failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// No profile with the given id
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
}

impl RegistryError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(e) => e.code(),
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
        }
    }
}
