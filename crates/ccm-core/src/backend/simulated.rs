//! Local-only backend used when the settings file is not accessible

use crate::backend::{BackendError, BackendMode, ConfigBackend};
use crate::profile::ExternalConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

const CREDENTIAL_PREFIX: &str = "sk-";
const CREDENTIAL_MIN_LEN: usize = 10;

/// Format-only credential check used in simulated mode
///
/// This is a weak approximation: it says nothing about whether the
/// credential works, only that it looks like one.
#[must_use]
pub fn credential_looks_valid(credential: &str) -> bool {
    credential.starts_with(CREDENTIAL_PREFIX) && credential.len() > CREDENTIAL_MIN_LEN
}

/// Gateway that keeps the last written settings in memory
#[derive(Default)]
pub struct SimulatedBackend {
    written: Mutex<Option<ExternalConfig>>,
    fail_writes: AtomicBool,
}

impl SimulatedBackend {
    /// Create an empty simulated backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Last successfully written settings
    #[must_use]
    pub fn written(&self) -> Option<ExternalConfig> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ConfigBackend for SimulatedBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    async fn config_path(&self) -> Result<PathBuf, BackendError> {
        Err(BackendError::Unsupported("simulated"))
    }

    async fn config_exists(&self) -> Result<bool, BackendError> {
        Ok(self.written().is_some())
    }

    async fn read_config(&self) -> Result<ExternalConfig, BackendError> {
        self.written().ok_or_else(|| BackendError::NotFound {
            path: PathBuf::from("<simulated>"),
        })
    }

    async fn write_config(&self, config: &ExternalConfig) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::WriteFailure {
                path: PathBuf::from("<simulated>"),
                message: "simulated write failure".to_string(),
            });
        }

        *self.written.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        Ok(())
    }

    async fn backup_config(&self) -> Result<PathBuf, BackendError> {
        Err(BackendError::BackupUnavailable)
    }

    async fn test_connection(
        &self,
        credential: &str,
        _endpoint: Option<&str>,
    ) -> Result<bool, BackendError> {
        Ok(credential_looks_valid(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_heuristic() {
        assert!(credential_looks_valid("sk-aaaaaaaaaa"));
        assert!(!credential_looks_valid("sk-short"));
        assert!(!credential_looks_valid("sk-aaaaaaa"));
        assert!(!credential_looks_valid("pk-aaaaaaaaaaaaaa"));
        assert!(!credential_looks_valid(""));
    }
}
