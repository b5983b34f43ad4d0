//! CLI integration tests using assert_cmd
//!
//! These tests verify the CLI commands work correctly end-to-end.

use assert_cmd::Command;
use ccm_core::ApiResponse;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated data and settings directories
struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            temp: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn claude_dir(&self) -> PathBuf {
        self.temp.path().join(".claude")
    }

    fn settings_path(&self) -> PathBuf {
        self.claude_dir().join("settings.json")
    }

    fn write_settings(&self, content: &str) {
        fs::create_dir_all(self.claude_dir()).unwrap();
        fs::write(self.settings_path(), content).unwrap();
    }

    /// Get a command instance for the ccm binary bound to this sandbox
    fn ccm(&self) -> Command {
        let mut cmd = Command::cargo_bin("ccm").expect("Failed to find ccm binary");
        cmd.env("HOME", self.temp.path())
            .env("CCM_HOME", self.temp.path().join("data"))
            .env("CCM_CLAUDE_DIR", self.claude_dir())
            .env_remove("CCM_SIMULATED")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn parse_envelope(stdout: &[u8]) -> Result<Value, String> {
    let response: ApiResponse<Value> =
        serde_json::from_slice(stdout).expect("stdout is a JSON envelope");
    response.into_result("empty response")
}

#[test]
fn test_help_command() {
    Sandbox::new()
        .ccm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CCM - Claude Code settings profile manager",
        ));
}

#[test]
fn test_version_command() {
    Sandbox::new()
        .ccm()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ccm"));
}

// =============================================================================
// Simulated Mode
// =============================================================================

#[test]
fn test_status_simulated() {
    Sandbox::new()
        .ccm()
        .args(["--simulated", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("simulated"))
        .stdout(predicate::str::contains("Active profile: (none)"));
}

#[test]
fn test_status_json_envelope() {
    let output = Sandbox::new()
        .ccm()
        .args(["--simulated", "--json", "status"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let data = parse_envelope(&output.stdout).unwrap();
    assert_eq!(data["mode"], "simulated");
    assert_eq!(data["profileCount"], 0);
}

#[test]
fn test_path_unavailable_when_simulated() {
    Sandbox::new()
        .ccm()
        .args(["--simulated", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("simulated mode"));
}

#[test]
fn test_backup_unavailable_when_simulated() {
    let output = Sandbox::new()
        .ccm()
        .args(["--simulated", "--json", "backup"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let response: ApiResponse<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response.code.as_deref(), Some("BACKUP_UNAVAILABLE"));
    assert!(parse_envelope(&output.stdout).is_err());
}

#[test]
fn test_key_heuristic_when_simulated() {
    let sandbox = Sandbox::new();
    sandbox
        .ccm()
        .args(["--simulated", "test", "--key", "sk-aaaaaaaaaaaa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("looks valid"));

    sandbox
        .ccm()
        .args(["--simulated", "test", "--key", "sk-short"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rejected"));
}

#[test]
fn test_shell_session() {
    let sandbox = Sandbox::new();
    sandbox
        .ccm()
        .args(["--simulated", "shell"])
        .write_stdin(
            "add Work --key sk-workwork01 -d \"day job\"\n\
             add Home --key sk-homehome01\n\
             use Work\n\
             delete Work\n\
             dup Home\n\
             list\n\
             status\n\
             quit\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("Now using"))
        .stdout(predicate::str::contains("Home (Copy)"))
        .stdout(predicate::str::contains("Active profile: Work"))
        .stderr(predicate::str::contains("Cannot delete the active profile"));

    // Simulated sessions leave the settings file alone
    assert!(!sandbox.settings_path().exists());
}

#[test]
fn test_shell_reports_unknown_commands() {
    Sandbox::new()
        .ccm()
        .args(["--simulated", "shell"])
        .write_stdin("frobnicate\nuse Nobody\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("frobnicate"))
        .stderr(predicate::str::contains("Profile not found: Nobody"));
}

// =============================================================================
// Real Mode
// =============================================================================

#[test]
fn test_apply_writes_settings() {
    let sandbox = Sandbox::new();
    sandbox.write_settings(r#"{"model": "opus", "env": {"ANTHROPIC_API_KEY": "sk-old"}}"#);

    let profile_file = sandbox.temp.path().join("work.json");
    fs::write(
        &profile_file,
        r#"{"name": "Work", "env": {"ANTHROPIC_API_KEY": "sk-workwork01"}, "permissions": {"allow": ["Read"], "deny": []}}"#,
    )
    .unwrap();

    sandbox
        .ccm()
        .arg("apply")
        .arg(&profile_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied profile 'Work'"));

    let settings: Value =
        serde_json::from_str(&fs::read_to_string(sandbox.settings_path()).unwrap()).unwrap();
    assert_eq!(settings["env"]["ANTHROPIC_API_KEY"], "sk-workwork01");
    assert_eq!(settings["permissions"]["allow"][0], "Read");
    assert_eq!(settings["model"], "opus");

    sandbox
        .ccm()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-workwork01"));
}

#[test]
fn test_apply_rejects_invalid_file() {
    let sandbox = Sandbox::new();
    let profile_file = sandbox.temp.path().join("broken.json");
    fs::write(&profile_file, r#"{"name": "x"}"#).unwrap();

    sandbox
        .ccm()
        .arg("apply")
        .arg(&profile_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid profile"));

    assert!(!sandbox.settings_path().exists());
}

#[test]
fn test_path_and_backup() {
    let sandbox = Sandbox::new();
    sandbox.write_settings(r#"{"env": {"ANTHROPIC_API_KEY": "sk-fromfile01"}}"#);

    sandbox
        .ccm()
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("settings.json"));

    sandbox
        .ccm()
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("settings_backup_"));

    let backups = fs::read_dir(sandbox.claude_dir())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("settings_backup_"))
        .count();
    assert_eq!(backups, 1);
}

#[test]
fn test_export_to_file() {
    let sandbox = Sandbox::new();
    sandbox.write_settings(r#"{"env": {"ANTHROPIC_API_KEY": "sk-fromfile01"}}"#);
    let export_file = sandbox.temp.path().join("profiles.json");

    sandbox
        .ccm()
        .arg("export")
        .arg("-o")
        .arg(&export_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 profile(s)"));

    let exported: Value = serde_json::from_str(&fs::read_to_string(&export_file).unwrap()).unwrap();
    assert_eq!(exported["name"], "Current Configuration");
    assert_eq!(exported["env"]["ANTHROPIC_API_KEY"], "sk-fromfile01");
    assert!(exported.get("id").is_none());
}
