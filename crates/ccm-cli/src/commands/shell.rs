//! Interactive session
//!
//! Keeps one registry alive for the whole process so named profiles can be
//! created, switched and exported without a settings file round-trip.

use anyhow::{bail, Context};
use ccm_core::profile::export::{read_import_payloads, write_exports};
use ccm_core::profile::ProfileUpdate;
use ccm_core::{NewProfile, ProfileEnv, Registry};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use super::Output;

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// List profiles
    List,
    /// Add a profile
    Add {
        /// Profile name
        name: String,
        /// API credential
        #[arg(long)]
        key: String,
        /// Endpoint override
        #[arg(long)]
        endpoint: Option<String>,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// Disable non-essential traffic
        #[arg(long)]
        no_traffic: bool,
    },
    /// Update a profile
    Update {
        /// Profile name or ID
        profile: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New credential
        #[arg(long)]
        key: Option<String>,
        /// New endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Write a profile to the settings file
    Use {
        /// Profile name or ID
        profile: String,
    },
    /// Delete a profile
    Delete {
        /// Profile name or ID
        profile: String,
    },
    /// Duplicate a profile
    Dup {
        /// Profile name or ID
        profile: String,
    },
    /// Export one profile, or all of them
    Export {
        /// Profile name or ID (defaults to all)
        profile: Option<String>,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import profiles from a file
    Import {
        /// Profile export file
        file: PathBuf,
    },
    /// Back up the settings file
    Backup,
    /// Test a profile's credential
    Test {
        /// Profile name or ID (defaults to the active profile)
        profile: Option<String>,
    },
    /// Show the registry overview
    Status,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

/// Run the read-eval-print loop on stdin until `quit` or end of input
pub async fn run(registry: &mut Registry, output: Output) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("ccm> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let line = line.context("Failed to read input")?;

        let words = match shell_words::split(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Help and usage errors are both printed by clap
                let _ = e.print();
                continue;
            }
        };

        if matches!(command, ShellCommand::Quit) {
            return Ok(());
        }
        if let Err(e) = execute(registry, command, output).await {
            eprintln!("Error: {e:#}");
        }
    }
}

async fn execute(
    registry: &mut Registry,
    command: ShellCommand,
    output: Output,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::List => {
            let profiles = registry.profiles();
            output.emit(&profiles, || {
                if profiles.is_empty() {
                    return "No profiles".to_string();
                }
                profiles
                    .iter()
                    .map(|p| {
                        let marker = if p.is_active { "*" } else { " " };
                        format!("{marker} {:<32} {}", p.id, p.name)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ShellCommand::Add {
            name,
            key,
            endpoint,
            description,
            no_traffic,
        } => {
            let data = NewProfile {
                description,
                env: ProfileEnv {
                    credential: key,
                    endpoint,
                    disable_nonessential_traffic: no_traffic.then_some(1),
                },
                ..NewProfile::new(name, "")
            };
            let id = registry.add_profile(data);
            output.emit(&id, || format!("Added {id}"))
        }
        ShellCommand::Update {
            profile,
            name,
            key,
            endpoint,
            description,
        } => {
            let id = resolve(registry, &profile)?;
            let env = if key.is_some() || endpoint.is_some() {
                let mut env = registry
                    .profile(&id)
                    .map(|p| p.env.clone())
                    .unwrap_or_default();
                if let Some(key) = key {
                    env.credential = key;
                }
                if endpoint.is_some() {
                    env.endpoint = endpoint;
                }
                Some(env)
            } else {
                None
            };

            let update = ProfileUpdate {
                name,
                description: description.map(Some),
                env,
                ..ProfileUpdate::default()
            };
            if update.is_empty() {
                bail!("Nothing to update");
            }
            registry.update_profile(&id, update);
            output.emit(&id, || format!("Updated {id}"))
        }
        ShellCommand::Use { profile } => {
            let id = resolve(registry, &profile)?;
            if !registry.set_active_profile(&id).await {
                bail!(
                    "Failed to apply profile: {}",
                    registry.last_error().unwrap_or("unknown error")
                );
            }
            output.emit(&id, || format!("Now using {id}"))
        }
        ShellCommand::Delete { profile } => {
            let id = resolve(registry, &profile)?;
            if !registry.delete_profile(&id) {
                bail!("Cannot delete the active profile");
            }
            output.emit(&id, || format!("Deleted {id}"))
        }
        ShellCommand::Dup { profile } => {
            let id = resolve(registry, &profile)?;
            let copy = registry
                .duplicate_profile(&id)
                .with_context(|| format!("Profile not found: {id}"))?;
            output.emit(&copy, || format!("Duplicated as {copy}"))
        }
        ShellCommand::Export { profile, output: file } => match profile {
            Some(profile) => {
                let id = resolve(registry, &profile)?;
                let export = registry
                    .export_profile(&id)
                    .with_context(|| format!("Profile not found: {id}"))?;
                match file {
                    Some(file) => {
                        write_exports(&file, std::slice::from_ref(&export))?;
                        output.emit(&file, || format!("Exported to {}", file.display()))
                    }
                    None => {
                        let pretty = serde_json::to_string_pretty(&export)?;
                        output.emit(&export, || pretty)
                    }
                }
            }
            None => super::export(registry, file.as_deref(), output),
        },
        ShellCommand::Import { file } => {
            let payloads = read_import_payloads(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = registry.import_profiles(&payloads);
            for (index, reason) in &report.rejected {
                eprintln!("Skipping entry {index}: {reason}");
            }
            output.emit(&report.imported, || {
                format!(
                    "Imported {} profile(s), rejected {}",
                    report.imported.len(),
                    report.rejected.len()
                )
            })
        }
        ShellCommand::Backup => super::backup(registry, output).await,
        ShellCommand::Test { profile } => {
            let id = match profile {
                Some(profile) => resolve(registry, &profile)?,
                None => registry
                    .active_profile_id()
                    .map(str::to_string)
                    .context("No active profile")?,
            };
            let target = registry
                .profile(&id)
                .cloned()
                .with_context(|| format!("Profile not found: {id}"))?;
            super::test_connection(registry, &target, output).await
        }
        ShellCommand::Status => super::status(registry, output),
        ShellCommand::Quit => Ok(()),
    }
}

/// Find a profile by id, falling back to its name
fn resolve(registry: &Registry, key: &str) -> anyhow::Result<String> {
    registry
        .profile(key)
        .or_else(|| registry.profile_by_name(key))
        .map(|p| p.id.clone())
        .with_context(|| format!("Profile not found: {key}"))
}
