//! Error types for backend operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a backend gateway
#[derive(Debug, Error)]
pub enum BackendError {
    /// Settings file does not exist
    #[error("Settings file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Settings file could not be read or parsed
    #[error("Failed to read {}: {message}", path.display())]
    ReadFailure { path: PathBuf, message: String },

    /// Settings file could not be written
    #[error("Failed to write {}: {message}", path.display())]
    WriteFailure { path: PathBuf, message: String },

    /// Backup could not be created
    #[error("Failed to create backup: {0}")]
    BackupFailure(String),

    /// Backups need the privileged backend
    #[error("Backup is only available when the settings file is accessible")]
    BackupUnavailable,

    /// Connection test could not complete
    #[error("Connection test failed: {0}")]
    ConnectionTestFailure(String),

    /// Operation not offered by this backend
    #[error("Operation not supported in {0} mode")]
    Unsupported(&'static str),
}

impl BackendError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ReadFailure { .. } => "READ_FAILURE",
            Self::WriteFailure { .. } => "WRITE_FAILURE",
            Self::BackupFailure(_) => "BACKUP_FAILURE",
            Self::BackupUnavailable => "BACKUP_UNAVAILABLE",
            Self::ConnectionTestFailure(_) => "CONNECTION_TEST_FAILURE",
            Self::Unsupported(_) => "UNSUPPORTED",
        }
    }
}
