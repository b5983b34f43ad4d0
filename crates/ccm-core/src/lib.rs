//! CCM Core - Profile registry, backend gateway and snapshot storage
//!
//! This crate manages named Claude Code settings profiles, writes the
//! active one to `settings.json`, and keeps a local snapshot of the
//! collection in `SQLite`.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod backend;
pub mod environment;
pub mod profile;
pub mod registry;
pub mod settings;
pub mod snapshot;
pub mod storage;

pub use backend::{ApiResponse, BackendError, BackendMode, ConfigBackend};
pub use profile::{ExternalConfig, NewProfile, Profile, ProfileEnv, ProfileUpdate};
pub use registry::{ImportReport, Registry, RegistryError};
pub use settings::EngineSettings;
pub use snapshot::SnapshotStore;
