//! Claude Code `settings.json` file operations
//!
//! Writes are atomic (temp file + rename in the same directory) and only
//! replace the keys this engine manages; everything else in the file is kept.

use crate::backend::BackendError;
use crate::profile::ExternalConfig;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Settings file name inside the Claude directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Env variables owned by the engine
const MANAGED_ENV_KEYS: [&str; 3] = [
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC",
];

/// Handle on a settings file
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    /// Settings file inside the given Claude directory
    #[must_use]
    pub fn in_dir(claude_dir: &Path) -> Self {
        Self {
            path: claude_dir.join(SETTINGS_FILE),
        }
    }

    /// Path of the settings file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the file
    ///
    /// # Errors
    /// Returns `NotFound` if the file is absent and `ReadFailure` on I/O or
    /// parse errors
    pub fn read(&self) -> Result<ExternalConfig, BackendError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BackendError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                self.read_failure(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|e| self.read_failure(e))
    }

    /// Write the managed keys into the file
    ///
    /// # Errors
    /// Returns `WriteFailure` if the file cannot be written
    pub fn write(&self, config: &ExternalConfig) -> Result<(), BackendError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| self.write_failure("settings path has no parent directory"))?;
        fs::create_dir_all(dir).map_err(|e| self.write_failure(e))?;

        let mut root = self.existing_object()?;
        merge_managed(&mut root, config).map_err(|e| self.write_failure(e))?;

        let content =
            serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| self.write_failure(e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.write_failure(e))?;
        temp.write_all(content.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| self.write_failure(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_failure(e.error))?;

        tracing::debug!(path = %self.path.display(), "settings written");
        Ok(())
    }

    /// Copy the file to a timestamped sibling
    ///
    /// # Errors
    /// Returns `BackupFailure` if the file is absent or the copy fails
    pub fn backup(&self) -> Result<PathBuf, BackendError> {
        if !self.exists() {
            return Err(BackendError::BackupFailure(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let dir = self.path.parent().ok_or_else(|| {
            BackendError::BackupFailure("settings path has no parent directory".to_string())
        })?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let mut backup_path = dir.join(format!("settings_backup_{timestamp}.json"));
        let mut attempt = 1;
        while backup_path.exists() {
            backup_path = dir.join(format!("settings_backup_{timestamp}_{attempt}.json"));
            attempt += 1;
        }

        fs::copy(&self.path, &backup_path).map_err(|e| {
            BackendError::BackupFailure(format!(
                "Failed to copy settings to {}: {e}",
                backup_path.display()
            ))
        })?;

        tracing::info!(backup = %backup_path.display(), "settings backed up");
        Ok(backup_path)
    }

    /// Current file content as a JSON object, or an empty object
    ///
    /// A file that is not a JSON object is backed up before it gets replaced.
    fn existing_object(&self) -> Result<Map<String, Value>, BackendError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.write_failure(e)),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                let backup = self.backup().map_err(|e| self.write_failure(e))?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "existing settings are not a JSON object, replacing them"
                );
                Ok(Map::new())
            }
        }
    }

    fn read_failure(&self, e: impl std::fmt::Display) -> BackendError {
        BackendError::ReadFailure {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }

    fn write_failure(&self, e: impl std::fmt::Display) -> BackendError {
        BackendError::WriteFailure {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

/// Replace the engine-owned keys of `root` with `config`
fn merge_managed(root: &mut Map<String, Value>, config: &ExternalConfig) -> serde_json::Result<()> {
    let Value::Object(managed_env) = serde_json::to_value(&config.env)? else {
        return Ok(());
    };

    let mut env = match root.remove("env") {
        Some(Value::Object(env)) => env,
        _ => Map::new(),
    };
    for key in MANAGED_ENV_KEYS {
        env.remove(key);
    }
    env.extend(managed_env);
    root.insert("env".to_string(), Value::Object(env));

    // Only allow/deny are managed; ask, defaultMode and the rest stay
    let mut permissions = match root.remove("permissions") {
        Some(Value::Object(permissions)) => permissions,
        _ => Map::new(),
    };
    if let Value::Object(managed) = serde_json::to_value(&config.permissions)? {
        permissions.extend(managed);
    }
    root.insert("permissions".to_string(), Value::Object(permissions));

    match &config.api_key_helper {
        Some(helper) => {
            root.insert("apiKeyHelper".to_string(), Value::String(helper.clone()));
        }
        None => {
            root.remove("apiKeyHelper");
        }
    }

    Ok(())
}
