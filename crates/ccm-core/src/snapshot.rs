//! Local snapshot persistence
//!
//! The registry's full state is serialized under one namespace key after
//! every mutation. Reads never fail: an absent or unreadable snapshot is
//! the empty default. Writes are best-effort and only logged on failure.

use crate::profile::Profile;
use crate::settings::EngineSettings;
use crate::storage::{BlobStore, Database, DatabaseError};
use serde::{Deserialize, Serialize};

/// Fixed namespace key of the snapshot blob
pub const SNAPSHOT_KEY: &str = "claude-config-manager";

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Serialized registry state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Profiles in insertion order
    #[serde(default)]
    pub configs: Vec<Profile>,
    /// Id of the active profile
    #[serde(default)]
    pub active_config_id: Option<String>,
    /// Format version
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            configs: Vec::new(),
            active_config_id: None,
            version: default_version(),
        }
    }
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// Borrowed form used when saving, to avoid cloning the collection
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    configs: &'a [Profile],
    active_config_id: Option<&'a str>,
    version: &'a str,
}

/// Snapshot persistence over a blob store
pub struct SnapshotStore {
    store: Box<dyn BlobStore>,
    key: String,
}

impl SnapshotStore {
    /// Wrap a blob store using the default namespace key
    #[must_use]
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self::with_key(store, SNAPSHOT_KEY)
    }

    /// Wrap a blob store using a custom namespace key
    #[must_use]
    pub fn with_key(store: Box<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Open the on-disk snapshot database described by the settings
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened
    pub fn open(settings: &EngineSettings) -> Result<Self, DatabaseError> {
        let db = Database::open(&settings.database_path())?;
        Ok(Self::with_key(Box::new(db), settings.snapshot_key.clone()))
    }

    /// Snapshot store backed by an in-memory database
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Box::new(Database::in_memory()?)))
    }

    /// Namespace key in use
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the snapshot, falling back to the empty default
    #[must_use]
    pub fn load(&self) -> Snapshot {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::default(),
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "failed to read snapshot");
                return Snapshot::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "failed to parse snapshot");
                Snapshot::default()
            }
        }
    }

    /// Persist the given state; failures are logged and swallowed
    pub fn save(&self, configs: &[Profile], active_config_id: Option<&str>) {
        let snapshot = SnapshotRef {
            configs,
            active_config_id,
            version: SNAPSHOT_VERSION,
        };

        let result = serde_json::to_string(&snapshot)
            .map_err(|e| DatabaseError::Unavailable(format!("Failed to serialize snapshot: {e}")))
            .and_then(|json| self.store.put(&self.key, &json));

        match result {
            Ok(()) => tracing::debug!(key = %self.key, profiles = configs.len(), "snapshot saved"),
            Err(e) => tracing::error!(key = %self.key, error = %e, "failed to save snapshot"),
        }
    }

    /// Remove the snapshot; failures are logged and swallowed
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::error!(key = %self.key, error = %e, "failed to clear snapshot");
        }
    }
}
