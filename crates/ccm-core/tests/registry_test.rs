//! Registry tests
//!
//! Exercises the registry against the simulated backend with an in-memory
//! snapshot store.

use ccm_core::backend::SimulatedBackend;
use ccm_core::profile::{
    NewProfile, Permissions, ProfileEnv, ProfileUpdate, ValidationFailure, CURRENT_PROFILE_ID,
};
use ccm_core::{BackendError, BackendMode, Registry, RegistryError, SnapshotStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn simulated_registry() -> (Registry, Arc<SimulatedBackend>) {
    let backend = Arc::new(SimulatedBackend::new());
    let snapshots = SnapshotStore::in_memory().expect("Failed to open snapshot store");
    let registry = Registry::new(Box::new(backend.clone()), snapshots);
    (registry, backend)
}

fn new_profile(name: &str, credential: &str) -> NewProfile {
    NewProfile::new(name, credential)
}

fn assert_single_active(registry: &Registry) {
    let active: Vec<_> = registry.profiles().iter().filter(|p| p.is_active).collect();
    assert!(active.len() <= 1, "more than one active profile");
    assert_eq!(
        active.first().map(|p| p.id.as_str()),
        registry.active_profile_id()
    );
}

// =============================================================================
// Lifecycle Scenarios
// =============================================================================

#[tokio::test]
async fn test_add_then_activate() {
    let (mut registry, backend) = simulated_registry();
    registry.initialize().await;
    assert_eq!(registry.mode(), BackendMode::Simulated);

    let id = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    assert_eq!(registry.profile_count(), 1);
    assert!(!registry.profile(&id).unwrap().is_active);

    assert!(registry.set_active_profile(&id).await);

    assert_eq!(registry.active_profile().unwrap().name, "A");
    let current = registry.profile(CURRENT_PROFILE_ID).expect("mirror exists");
    assert_eq!(current.env.credential, "sk-aaaaaaaaaa");
    assert_eq!(registry.profiles()[0].id, CURRENT_PROFILE_ID);
    assert_eq!(
        backend.written().unwrap().env.credential,
        "sk-aaaaaaaaaa"
    );
    assert_single_active(&registry);
}

#[tokio::test]
async fn test_duplicate_profile() {
    let (mut registry, _) = simulated_registry();
    let id = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    std::thread::sleep(Duration::from_millis(5));

    let copy_id = registry.duplicate_profile(&id).expect("duplicate");
    let original = registry.profile(&id).unwrap();
    let copy = registry.profile(&copy_id).unwrap();

    assert_ne!(copy_id, id);
    assert_eq!(copy.name, "A (Copy)");
    assert!(!copy.is_active);
    assert_eq!(copy.env, original.env);
    assert_ne!(copy.created_at, original.created_at);
    assert_ne!(copy.updated_at, original.updated_at);
}

#[test]
fn test_duplicate_unknown_profile() {
    let (mut registry, _) = simulated_registry();
    assert!(registry.duplicate_profile("missing").is_none());
    assert_eq!(registry.profile_count(), 0);
}

#[test]
fn test_delete_inactive_profile() {
    let (mut registry, _) = simulated_registry();
    let id = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    registry.add_profile(new_profile("B", "sk-bbbbbbbbbb"));

    assert!(registry.delete_profile(&id));
    assert_eq!(registry.profile_count(), 1);
    assert!(registry.profile(&id).is_none());
    assert!(!registry.delete_profile(&id));
}

#[test]
fn test_update_profile() {
    let (mut registry, _) = simulated_registry();
    let id = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    let before = registry.profile(&id).unwrap().clone();
    std::thread::sleep(Duration::from_millis(5));

    let update = ProfileUpdate {
        name: Some("Renamed".to_string()),
        description: Some(Some("work account".to_string())),
        ..ProfileUpdate::default()
    };
    assert!(registry.update_profile(&id, update));

    let after = registry.profile(&id).unwrap();
    assert_eq!(after.name, "Renamed");
    assert_eq!(after.description.as_deref(), Some("work account"));
    assert_eq!(after.env, before.env);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);

    assert!(!registry.update_profile("missing", ProfileUpdate::default()));
}

// =============================================================================
// Invariants
// =============================================================================

#[tokio::test]
async fn test_single_active_across_switches() {
    let (mut registry, _) = simulated_registry();
    let a = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    let b = registry.add_profile(new_profile("B", "sk-bbbbbbbbbb"));

    assert!(registry.set_active_profile(&a).await);
    assert_single_active(&registry);
    assert!(registry.set_active_profile(&b).await);
    assert_single_active(&registry);
    assert!(registry.set_active_profile(CURRENT_PROFILE_ID).await);
    assert_single_active(&registry);
    assert_eq!(registry.active_profile_id(), Some(CURRENT_PROFILE_ID));

    assert!(!registry.set_active_profile("missing").await);
    assert_single_active(&registry);
}

#[tokio::test]
async fn test_delete_active_is_refused() {
    let (mut registry, _) = simulated_registry();
    let id = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    assert!(registry.set_active_profile(&id).await);

    let before = registry.profiles().to_vec();
    assert!(!registry.delete_profile(&id));
    assert_eq!(registry.profiles(), before.as_slice());
    assert_eq!(registry.active_profile_id(), Some(id.as_str()));
}

#[tokio::test]
async fn test_failed_apply_changes_nothing() {
    let (mut registry, backend) = simulated_registry();
    let a = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    let b = registry.add_profile(new_profile("B", "sk-bbbbbbbbbb"));
    assert!(registry.set_active_profile(&a).await);

    let before = registry.profiles().to_vec();
    backend.set_fail_writes(true);

    assert!(!registry.set_active_profile(&b).await);
    assert_eq!(registry.profiles(), before.as_slice());
    assert_eq!(registry.active_profile_id(), Some(a.as_str()));
    assert!(registry.last_error().is_some());
    assert!(!registry.is_loading());
    assert_eq!(backend.written().unwrap().env.credential, "sk-aaaaaaaaaa");
}

#[tokio::test]
async fn test_mirror_is_inactive_copy_of_applied() {
    let (mut registry, _) = simulated_registry();
    let a = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    let b = registry.add_profile(new_profile("B", "sk-bbbbbbbbbb"));

    assert!(registry.set_active_profile(&a).await);
    assert!(registry.set_active_profile(&b).await);

    let mirrors: Vec<_> = registry
        .profiles()
        .iter()
        .filter(|p| p.id == CURRENT_PROFILE_ID)
        .collect();
    assert_eq!(mirrors.len(), 1);
    assert_eq!(mirrors[0].env.credential, "sk-bbbbbbbbbb");
    assert!(!mirrors[0].is_active);
}

#[tokio::test]
async fn test_name_lookup_prefers_named_profile_over_mirror() {
    let (mut registry, _) = simulated_registry();
    let a = registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    assert!(registry.set_active_profile(&a).await);

    assert_eq!(registry.profile(CURRENT_PROFILE_ID).unwrap().name, "A");
    assert_eq!(registry.profile_by_name("A").unwrap().id, a);
}

#[tokio::test]
async fn test_apply_unregistered_profile() {
    let (mut registry, backend) = simulated_registry();
    let stray = ccm_core::Profile::new(new_profile("Stray", "sk-ssssssssss"));

    assert!(!registry.apply_profile(&stray).await);
    assert!(backend.written().is_none());
    assert!(registry.active_profile_id().is_none());
    assert!(registry.last_error().unwrap().contains(&stray.id));
}

// =============================================================================
// Export / Import
// =============================================================================

#[test]
fn test_export_import_preserves_content() {
    let (mut registry, _) = simulated_registry();
    let mut data = new_profile("A", "sk-aaaaaaaaaa");
    data.env = ProfileEnv {
        credential: "sk-aaaaaaaaaa".to_string(),
        endpoint: Some("https://proxy.example.com".to_string()),
        disable_nonessential_traffic: Some(1),
    };
    data.permissions = Some(Permissions {
        allow: vec!["Bash(git:*)".to_string()],
        deny: vec!["WebFetch".to_string()],
    });
    data.api_key_helper = Some("/usr/local/bin/key-helper".to_string());
    let id = registry.add_profile(data);

    let export = registry.export_profile(&id).expect("export");
    let raw = serde_json::to_value(&export).unwrap();
    assert!(raw.get("id").is_none());
    assert!(raw.get("isActive").is_none());

    let imported = registry.import_profile(&raw).expect("import");
    let original = registry.profile(&id).unwrap();
    let copy = registry.profile(&imported).unwrap();
    assert_ne!(imported, id);
    assert_eq!(copy.env, original.env);
    assert_eq!(copy.permissions, original.permissions);
    assert_eq!(copy.api_key_helper, original.api_key_helper);
}

#[test]
fn test_import_without_credential_is_rejected() {
    let (mut registry, _) = simulated_registry();
    registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    let before = registry.profiles().to_vec();

    assert!(registry.import_profile(&json!({"name": "x"})).is_none());
    assert_eq!(registry.profiles(), before.as_slice());
    assert_eq!(
        registry.last_import_rejection(),
        Some(&ValidationFailure::MissingEnv)
    );

    assert!(registry
        .import_profile(&json!({"name": "x", "env": {}}))
        .is_none());
    assert_eq!(
        registry.last_import_rejection(),
        Some(&ValidationFailure::MissingCredential)
    );
}

#[test]
fn test_import_batch_report() {
    let (mut registry, _) = simulated_registry();
    let payloads = vec![
        json!({"name": "A", "env": {"ANTHROPIC_API_KEY": "sk-aaaaaaaaaa"}}),
        json!("not a profile"),
        json!({"name": "B", "env": {"ANTHROPIC_API_KEY": "sk-bbbbbbbbbb"}}),
    ];

    let report = registry.import_profiles(&payloads);

    assert_eq!(report.imported.len(), 2);
    assert_eq!(report.rejected, vec![(1, ValidationFailure::NotAnObject)]);
    assert_eq!(registry.profile_count(), 2);
}

#[test]
fn test_export_all_profiles() {
    let (mut registry, _) = simulated_registry();
    registry.add_profile(new_profile("A", "sk-aaaaaaaaaa"));
    registry.add_profile(new_profile("B", "sk-bbbbbbbbbb"));

    let names: Vec<_> = registry
        .export_all_profiles()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

// =============================================================================
// Gateway Actions
// =============================================================================

#[tokio::test]
async fn test_connection_heuristic_in_simulated_mode() {
    let (mut registry, _) = simulated_registry();
    let good = registry.add_profile(new_profile("Good", "sk-aaaaaaaaaa"));
    let bad = registry.add_profile(new_profile("Bad", "sk-short"));

    let good = registry.profile(&good).unwrap().clone();
    let bad = registry.profile(&bad).unwrap().clone();
    assert!(registry.test_profile_connection(&good).await);
    assert!(!registry.test_profile_connection(&bad).await);
}

#[tokio::test]
async fn test_backup_unavailable_in_simulated_mode() {
    let (mut registry, _) = simulated_registry();
    let err = registry.backup_current_profile().await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Backend(BackendError::BackupUnavailable)
    ));
    assert_eq!(err.code(), "BACKUP_UNAVAILABLE");
}
