//! Engine settings resolved from the environment
//!
//! | Variable                   | Meaning                                   |
//! |----------------------------|-------------------------------------------|
//! | `CCM_HOME`                 | data directory (snapshot database)        |
//! | `CCM_CLAUDE_DIR`           | directory holding `settings.json`         |
//! | `CCM_SIMULATED`            | force simulated mode when truthy          |
//! | `CCM_CONNECT_TIMEOUT_SECS` | timeout for live connection tests         |

use crate::snapshot::SNAPSHOT_KEY;
use std::path::PathBuf;
use std::time::Duration;

const DATABASE_FILE: &str = "ccm.db";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by the registry, gateway and snapshot store
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Where the snapshot database lives
    pub data_dir: PathBuf,
    /// Directory holding Claude Code's `settings.json`, if one can be resolved
    pub claude_dir: Option<PathBuf>,
    /// Run without the privileged backend even when it is available
    pub force_simulated: bool,
    /// Timeout for live connection tests
    pub connect_timeout: Duration,
    /// Namespace key of the snapshot blob
    pub snapshot_key: String,
}

impl EngineSettings {
    /// Resolve settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("CCM_HOME")
            .filter(|v| !v.is_empty())
            .map_or_else(|| default_data_dir(&lookup), PathBuf::from);

        let claude_dir = lookup("CCM_CLAUDE_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(default_claude_dir);

        let force_simulated = lookup("CCM_SIMULATED").is_some_and(|v| is_truthy(&v));

        let connect_timeout = lookup("CCM_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs);

        Self {
            data_dir,
            claude_dir,
            force_simulated,
            connect_timeout,
            snapshot_key: SNAPSHOT_KEY.to_string(),
        }
    }

    /// Override the data directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Override the settings directory
    #[must_use]
    pub fn with_claude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.claude_dir = Some(dir.into());
        self
    }

    /// Force (or stop forcing) simulated mode
    #[must_use]
    pub fn simulated(mut self, simulated: bool) -> Self {
        self.force_simulated = simulated;
        self
    }

    /// Path of the snapshot database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Get the application data directory
///
/// Priority:
/// 1. $HOME/.ccm
/// 2. %USERPROFILE%\.ccm on Windows
/// 3. $XDG_DATA_HOME/ccm
/// 4. A temp directory (data will not survive a reboot)
fn default_data_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".ccm");
    }

    if let Some(profile) = lookup("USERPROFILE").filter(|v| !v.is_empty()) {
        return PathBuf::from(profile).join(".ccm");
    }

    if let Some(xdg_data) = lookup("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg_data).join("ccm");
    }

    let temp = std::env::temp_dir().join("ccm-data");
    tracing::warn!(
        path = %temp.display(),
        "could not determine home directory, using temporary location"
    );
    temp
}

/// Default location of Claude Code's settings directory
#[must_use]
pub fn default_claude_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().map(|dir| dir.join(".claude"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|dir| dir.join(".claude"))
    }
}
