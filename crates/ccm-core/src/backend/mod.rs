//! Backend gateway
//!
//! Capability interface between the registry and the external settings
//! file. Two variants exist: [`RealBackend`] works on the file and performs
//! live connection tests, [`SimulatedBackend`] never touches the file system
//! or the network.

mod error;
mod real;
mod response;
pub mod settings_file;
mod simulated;

pub use error::BackendError;
pub use real::RealBackend;
pub use response::ApiResponse;
pub use settings_file::SettingsFile;
pub use simulated::{credential_looks_valid, SimulatedBackend};

use crate::environment::Detection;
use crate::profile::ExternalConfig;
use crate::settings::EngineSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Which gateway variant is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Privileged file access
    Real,
    /// Local-only simulation
    Simulated,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Real => write!(f, "real"),
            BackendMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// Operations the registry needs from the settings file's environment
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Variant of this backend
    fn mode(&self) -> BackendMode;

    /// Location of the settings file
    async fn config_path(&self) -> Result<PathBuf, BackendError>;

    /// Whether the settings file exists
    async fn config_exists(&self) -> Result<bool, BackendError>;

    /// Read the settings file
    async fn read_config(&self) -> Result<ExternalConfig, BackendError>;

    /// Write the settings file
    async fn write_config(&self, config: &ExternalConfig) -> Result<(), BackendError>;

    /// Copy the settings file to a timestamped sibling, returning its path
    async fn backup_config(&self) -> Result<PathBuf, BackendError>;

    /// Check a credential against the remote endpoint
    async fn test_connection(
        &self,
        credential: &str,
        endpoint: Option<&str>,
    ) -> Result<bool, BackendError>;
}

#[async_trait]
impl<T: ConfigBackend + ?Sized> ConfigBackend for Arc<T> {
    fn mode(&self) -> BackendMode {
        (**self).mode()
    }

    async fn config_path(&self) -> Result<PathBuf, BackendError> {
        (**self).config_path().await
    }

    async fn config_exists(&self) -> Result<bool, BackendError> {
        (**self).config_exists().await
    }

    async fn read_config(&self) -> Result<ExternalConfig, BackendError> {
        (**self).read_config().await
    }

    async fn write_config(&self, config: &ExternalConfig) -> Result<(), BackendError> {
        (**self).write_config(config).await
    }

    async fn backup_config(&self) -> Result<PathBuf, BackendError> {
        (**self).backup_config().await
    }

    async fn test_connection(
        &self,
        credential: &str,
        endpoint: Option<&str>,
    ) -> Result<bool, BackendError> {
        (**self).test_connection(credential, endpoint).await
    }
}

/// Pick the gateway variant for a detection result
#[must_use]
pub fn select(detection: Detection, settings: &EngineSettings) -> Box<dyn ConfigBackend> {
    match (&settings.claude_dir, detection.privileged) {
        (Some(dir), true) => {
            tracing::debug!(dir = %dir.display(), "using real backend");
            Box::new(RealBackend::new(dir, settings.connect_timeout))
        }
        _ => {
            tracing::debug!("using simulated backend");
            Box::new(SimulatedBackend::new())
        }
    }
}
