//! Host capability detection
//!
//! Decides whether the privileged file backend can be used or whether the
//! engine has to run in simulated mode. Simulated mode is an expected
//! outcome, not an error.

use crate::settings::EngineSettings;
use std::path::PathBuf;

/// Capability markers inspected by the detector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMarkers {
    /// Simulated mode was requested explicitly
    pub force_simulated: bool,
    /// Resolved settings directory, if any
    pub settings_dir: Option<PathBuf>,
}

impl HostMarkers {
    /// Markers derived from engine settings
    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            force_simulated: settings.force_simulated,
            settings_dir: settings.claude_dir.clone(),
        }
    }
}

/// Result of environment detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Whether the privileged file backend is available
    pub privileged: bool,
}

/// Detect the environment from engine settings
#[must_use]
pub fn detect(settings: &EngineSettings) -> Detection {
    detect_from(&HostMarkers::from_settings(settings))
}

/// Detect the environment from explicit markers
#[must_use]
pub fn detect_from(markers: &HostMarkers) -> Detection {
    Detection {
        privileged: !markers.force_simulated && markers.settings_dir.is_some(),
    }
}
