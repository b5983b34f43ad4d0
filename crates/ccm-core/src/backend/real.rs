//! Backend with privileged access to the settings file

use crate::backend::{BackendError, BackendMode, ConfigBackend, SettingsFile};
use crate::profile::ExternalConfig;
use async_trait::async_trait;
use ccm_providers::{AnthropicClient, KeyValidator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Gateway operating on the real settings file
pub struct RealBackend {
    file: SettingsFile,
    validator: Arc<dyn KeyValidator>,
}

impl RealBackend {
    /// Backend for the settings file in `claude_dir`, testing connections
    /// against the Anthropic API
    #[must_use]
    pub fn new(claude_dir: &Path, connect_timeout: Duration) -> Self {
        Self::with_validator(
            claude_dir,
            Arc::new(AnthropicClient::with_timeout(connect_timeout)),
        )
    }

    /// Backend using a custom credential validator
    #[must_use]
    pub fn with_validator(claude_dir: &Path, validator: Arc<dyn KeyValidator>) -> Self {
        Self {
            file: SettingsFile::in_dir(claude_dir),
            validator,
        }
    }
}

#[async_trait]
impl ConfigBackend for RealBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Real
    }

    async fn config_path(&self) -> Result<PathBuf, BackendError> {
        Ok(self.file.path().to_path_buf())
    }

    async fn config_exists(&self) -> Result<bool, BackendError> {
        Ok(self.file.exists())
    }

    async fn read_config(&self) -> Result<ExternalConfig, BackendError> {
        self.file.read()
    }

    async fn write_config(&self, config: &ExternalConfig) -> Result<(), BackendError> {
        self.file.write(config)
    }

    async fn backup_config(&self) -> Result<PathBuf, BackendError> {
        self.file.backup()
    }

    async fn test_connection(
        &self,
        credential: &str,
        endpoint: Option<&str>,
    ) -> Result<bool, BackendError> {
        self.validator
            .validate_key(credential, endpoint)
            .await
            .map(ccm_providers::KeyStatus::is_valid)
            .map_err(|e| BackendError::ConnectionTestFailure(e.to_string()))
    }
}
