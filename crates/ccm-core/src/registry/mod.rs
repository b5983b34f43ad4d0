//! Profile registry
//!
//! Owns the profile collection and the active pointer, keeps them in sync
//! with the external settings file through a [`ConfigBackend`], and
//! persists a snapshot after every successful change.
//!
//! The registry has a single writer: every mutating method takes
//! `&mut self`, so overlapping mutations on one instance cannot happen.

mod error;

pub use error::RegistryError;

use crate::backend::{self, BackendError, BackendMode, ConfigBackend};
use crate::environment;
use crate::profile::{
    NewProfile, Profile, ProfileExport, ProfileUpdate, ValidatedImport, ValidationFailure,
    CURRENT_PROFILE_ID, CURRENT_PROFILE_NAME,
};
use crate::settings::EngineSettings;
use crate::snapshot::SnapshotStore;
use crate::storage::DatabaseError;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const COPY_SUFFIX: &str = " (Copy)";

/// Outcome of a batch import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids of the created profiles, in payload order
    pub imported: Vec<String>,
    /// Index of each rejected payload with the reason
    pub rejected: Vec<(usize, ValidationFailure)>,
}

/// The profile management engine
pub struct Registry {
    profiles: Vec<Profile>,
    active_profile_id: Option<String>,
    backend: Box<dyn ConfigBackend>,
    snapshots: SnapshotStore,
    mode: BackendMode,
    loading: bool,
    last_error: Option<String>,
    config_path: Option<PathBuf>,
    has_external_config: bool,
    last_import_rejection: Option<ValidationFailure>,
}

impl Registry {
    /// Create a registry over an already selected backend
    #[must_use]
    pub fn new(backend: Box<dyn ConfigBackend>, snapshots: SnapshotStore) -> Self {
        let mode = backend.mode();
        Self {
            profiles: Vec::new(),
            active_profile_id: None,
            backend,
            snapshots,
            mode,
            loading: false,
            last_error: None,
            config_path: None,
            has_external_config: false,
            last_import_rejection: None,
        }
    }

    /// Detect the environment, select the backend and open the snapshot store
    ///
    /// # Errors
    /// Returns an error if the snapshot database cannot be opened
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, DatabaseError> {
        let detection = environment::detect(settings);
        let backend = backend::select(detection, settings);
        let snapshots = SnapshotStore::open(settings)?;
        Ok(Self::new(backend, snapshots))
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Reconcile local state with the settings file
    ///
    /// Never fails: unexpected gateway errors end up in [`Self::last_error`]
    /// and the registry stays usable with whatever was loaded.
    pub async fn initialize(&mut self) {
        self.loading = true;
        self.last_error = None;
        tracing::info!(mode = %self.mode, "initializing registry");

        if let Err(e) = self.reconcile().await {
            tracing::warn!(error = %e, "registry initialization failed");
            self.last_error = Some(e.to_string());
        }

        self.loading = false;
    }

    async fn reconcile(&mut self) -> Result<(), BackendError> {
        match self.mode {
            BackendMode::Real => {
                self.config_path = Some(self.backend.config_path().await?);
                self.has_external_config = self.backend.config_exists().await?;

                if self.has_external_config {
                    match self.backend.read_config().await {
                        Ok(config) => {
                            // File-of-record wins over any locally kept profiles
                            self.clear_local();
                            let mut current = Profile::mirror_of(&config, CURRENT_PROFILE_NAME);
                            current.is_active = true;
                            self.profiles.push(current);
                            self.active_profile_id = Some(CURRENT_PROFILE_ID.to_string());
                            self.persist();
                        }
                        Err(e) => {
                            // Keep working from the last snapshot until the file is fixed
                            tracing::warn!(error = %e, "failed to load settings file");
                            self.load_snapshot();
                        }
                    }
                } else {
                    self.clear_local();
                }
            }
            BackendMode::Simulated => {
                self.has_external_config = false;
                self.clear_local();
            }
        }

        tracing::debug!(
            profiles = self.profiles.len(),
            active = ?self.active_profile_id,
            "registry initialized"
        );
        Ok(())
    }

    /// Drop all profiles and the stored snapshot
    pub fn clear_local(&mut self) {
        self.snapshots.clear();
        self.profiles.clear();
        self.active_profile_id = None;
    }

    fn load_snapshot(&mut self) {
        let snapshot = self.snapshots.load();
        tracing::debug!(
            key = %self.snapshots.key(),
            profiles = snapshot.configs.len(),
            "rehydrating from snapshot"
        );
        self.profiles = snapshot.configs;
        self.active_profile_id = snapshot.active_config_id;
        self.repair();
    }

    /// Restore id uniqueness and re-derive `is_active` from the active pointer
    fn repair(&mut self) {
        let mut seen = HashSet::new();
        self.profiles.retain(|p| seen.insert(p.id.clone()));

        if let Some(active) = &self.active_profile_id {
            if !self.profiles.iter().any(|p| &p.id == active) {
                tracing::warn!(id = %active, "dropping dangling active profile reference");
                self.active_profile_id = None;
            }
        }

        let active = self.active_profile_id.as_deref();
        for profile in &mut self.profiles {
            profile.is_active = Some(profile.id.as_str()) == active;
        }
    }

    fn persist(&self) {
        self.snapshots
            .save(&self.profiles, self.active_profile_id.as_deref());
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All profiles in insertion order
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Look up a profile by id
    #[must_use]
    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Look up a profile by exact name
    ///
    /// The mirror carries the name of the last applied profile, so a named
    /// profile wins over it.
    #[must_use]
    pub fn profile_by_name(&self, name: &str) -> Option<&Profile> {
        let mut matches = self.profiles.iter().filter(|p| p.name == name);
        let first = matches.next()?;
        if first.is_current() {
            matches.next().or(Some(first))
        } else {
            Some(first)
        }
    }

    /// The profile currently written to the settings file
    #[must_use]
    pub fn active_profile(&self) -> Option<&Profile> {
        self.active_profile_id
            .as_deref()
            .and_then(|id| self.profile(id))
    }

    /// Id of the active profile
    #[must_use]
    pub fn active_profile_id(&self) -> Option<&str> {
        self.active_profile_id.as_deref()
    }

    /// Number of profiles
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    /// Backend variant in use
    #[must_use]
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Whether a gateway call is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed gateway operation
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Forget the last error
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Settings file location (real mode, after initialization)
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Whether the settings file existed at initialization
    #[must_use]
    pub fn has_external_config(&self) -> bool {
        self.has_external_config
    }

    /// Why the most recent import was rejected, if it was
    #[must_use]
    pub fn last_import_rejection(&self) -> Option<&ValidationFailure> {
        self.last_import_rejection.as_ref()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a profile and return its id
    pub fn add_profile(&mut self, data: NewProfile) -> String {
        let mut profile = Profile::new(data);
        while self.index_of(&profile.id).is_some() {
            profile.id = crate::profile::generate_id();
        }

        let id = profile.id.clone();
        tracing::debug!(%id, name = %profile.name, "profile added");
        self.profiles.push(profile);
        self.persist();
        id
    }

    /// Merge `update` into a profile; false if the id is unknown
    pub fn update_profile(&mut self, id: &str, update: ProfileUpdate) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let profile = &mut self.profiles[index];
        update.apply_to(profile);
        profile.updated_at = Utc::now();

        tracing::debug!(%id, "profile updated");
        self.persist();
        true
    }

    /// Delete a profile; false if unknown or active
    pub fn delete_profile(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.profiles[index].is_active {
            tracing::debug!(%id, "refusing to delete active profile");
            return false;
        }

        self.profiles.remove(index);
        if self.active_profile_id.as_deref() == Some(id) {
            self.active_profile_id = None;
        }

        tracing::debug!(%id, "profile deleted");
        self.persist();
        true
    }

    /// Make the profile with `id` active; false if unknown or the write fails
    pub async fn set_active_profile(&mut self, id: &str) -> bool {
        let Some(profile) = self.profile(id).cloned() else {
            return false;
        };
        self.apply_profile(&profile).await
    }

    /// Write a profile to the settings file and mark it active
    ///
    /// The stored profile with the same id is the one written. On failure
    /// nothing in the registry changes and [`Self::last_error`] says why.
    pub async fn apply_profile(&mut self, profile: &Profile) -> bool {
        let Some(index) = self.index_of(&profile.id) else {
            self.last_error = Some(RegistryError::ProfileNotFound(profile.id.clone()).to_string());
            return false;
        };

        let target = &self.profiles[index];
        let config = target.to_external();
        let name = target.name.clone();
        let is_current = target.is_current();

        self.loading = true;
        self.last_error = None;
        let written = self.backend.write_config(&config).await;
        self.loading = false;

        if let Err(e) = written {
            tracing::warn!(id = %profile.id, error = %e, "failed to apply profile");
            self.last_error = Some(e.to_string());
            return false;
        }

        for p in &mut self.profiles {
            p.is_active = false;
        }
        let target = &mut self.profiles[index];
        target.is_active = true;
        target.updated_at = Utc::now();
        self.active_profile_id = Some(target.id.clone());

        if is_current {
            // The file now holds the filled-in defaults
            target.env = config.env;
            target.permissions = Some(config.permissions);
        } else {
            let mirror = Profile::mirror_of(&config, name);
            match self.index_of(CURRENT_PROFILE_ID) {
                Some(i) => self.profiles[i] = mirror,
                None => self.profiles.insert(0, mirror),
            }
        }

        tracing::info!(id = %profile.id, "profile applied");
        self.persist();
        true
    }

    /// Copy a profile under the name `"<name> (Copy)"`
    pub fn duplicate_profile(&mut self, id: &str) -> Option<String> {
        let mut data = self.profile(id)?.to_new_profile();
        data.name.push_str(COPY_SUFFIX);
        Some(self.add_profile(data))
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Export one profile without bookkeeping fields
    #[must_use]
    pub fn export_profile(&self, id: &str) -> Option<ProfileExport> {
        self.profile(id).map(ProfileExport::from)
    }

    /// Export every profile without bookkeeping fields
    #[must_use]
    pub fn export_all_profiles(&self) -> Vec<ProfileExport> {
        self.profiles.iter().map(ProfileExport::from).collect()
    }

    /// Import an untyped payload; `None` if it fails validation
    ///
    /// The rejection reason is kept in [`Self::last_import_rejection`].
    pub fn import_profile(&mut self, raw: &Value) -> Option<String> {
        match ValidatedImport::parse(raw) {
            Ok(valid) => {
                self.last_import_rejection = None;
                Some(self.add_profile(valid.into_inner()))
            }
            Err(reason) => {
                tracing::debug!(%reason, "import rejected");
                self.last_import_rejection = Some(reason);
                None
            }
        }
    }

    /// Import several payloads, reporting which were rejected
    pub fn import_profiles(&mut self, payloads: &[Value]) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, raw) in payloads.iter().enumerate() {
            match self.import_profile(raw) {
                Some(id) => report.imported.push(id),
                None => {
                    if let Some(reason) = self.last_import_rejection.clone() {
                        report.rejected.push((index, reason));
                    }
                }
            }
        }
        report
    }

    // ------------------------------------------------------------------
    // Gateway actions
    // ------------------------------------------------------------------

    /// Back up the settings file, returning the backup path
    ///
    /// # Errors
    /// Returns `BackupUnavailable` in simulated mode, or the gateway's
    /// error if the backup fails
    pub async fn backup_current_profile(&mut self) -> Result<PathBuf, RegistryError> {
        if self.mode != BackendMode::Real {
            return Err(BackendError::BackupUnavailable.into());
        }

        self.loading = true;
        let result = self.backend.backup_config().await;
        self.loading = false;

        result.map_err(|e| {
            self.last_error = Some(e.to_string());
            e.into()
        })
    }

    /// Test a profile's credential
    ///
    /// Real mode performs a live request; simulated mode only checks the
    /// credential's format. Failures to reach the endpoint count as `false`.
    pub async fn test_profile_connection(&mut self, profile: &Profile) -> bool {
        self.loading = true;
        let result = self
            .backend
            .test_connection(&profile.env.credential, profile.env.endpoint.as_deref())
            .await;
        self.loading = false;

        match result {
            Ok(reachable) => reachable,
            Err(e) => {
                tracing::warn!(id = %profile.id, error = %e, "connection test failed");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }
}
