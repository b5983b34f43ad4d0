//! CCM CLI - Command-line interface for CCM
//!
//! Provides `ccm status`, `ccm apply`, `ccm export`, `ccm shell`, and other
//! commands.

mod commands;

use anyhow::Context;
use ccm_core::{ApiResponse, BackendError, EngineSettings, Registry, RegistryError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::Output;

#[derive(Parser)]
#[command(name = "ccm")]
#[command(about = "CCM - Claude Code settings profile manager")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `warn`, `debug`, `ccm_core=trace`)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Never touch the settings file
    #[arg(long, global = true)]
    simulated: bool,

    /// Directory holding settings.json (overrides CCM_CLAUDE_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    claude_dir: Option<PathBuf>,

    /// Directory for the local snapshot database (overrides CCM_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend mode, settings path and active profile
    Status,
    /// Print the settings file path
    Path,
    /// Print the current settings as a profile export
    Show,
    /// Back up the settings file
    Backup,
    /// Test a credential against the API
    Test {
        /// Credential to test (defaults to the active profile's)
        #[arg(long)]
        key: Option<String>,
        /// Endpoint to test against
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Import the profile(s) in FILE and activate the first one
    Apply {
        /// Profile export file
        file: PathBuf,
    },
    /// Export all profiles
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start an interactive session
    Shell,
}

impl Cli {
    fn engine_settings(&self) -> EngineSettings {
        let mut settings = EngineSettings::from_env();
        if let Some(dir) = &self.data_dir {
            settings = settings.with_data_dir(dir);
        }
        if let Some(dir) = &self.claude_dir {
            settings = settings.with_claude_dir(dir);
        }
        if self.simulated {
            settings = settings.simulated(true);
        }
        settings
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let settings = cli.engine_settings();
    let output = Output { json: cli.json };

    if let Err(e) = run(cli.command, &settings, output) {
        if output.json {
            let code = e
                .downcast_ref::<RegistryError>()
                .map(RegistryError::code)
                .or_else(|| e.downcast_ref::<BackendError>().map(BackendError::code));
            let response = ApiResponse::<()> {
                code: code.map(str::to_string),
                ..ApiResponse::error(format!("{e:#}"))
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_default()
            );
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, settings: &EngineSettings, output: Output) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(execute(command, settings, output))
}

async fn execute(command: Commands, settings: &EngineSettings, output: Output) -> anyhow::Result<()> {
    let mut registry = Registry::from_settings(settings).with_context(|| {
        format!(
            "Failed to open snapshot database at {}",
            settings.database_path().display()
        )
    })?;
    registry.initialize().await;
    if let Some(e) = registry.last_error() {
        tracing::warn!(error = %e, "initialization finished with errors");
    }

    match command {
        Commands::Status => commands::status(&registry, output),
        Commands::Path => commands::path(&registry, output),
        Commands::Show => commands::show(&registry, output),
        Commands::Backup => commands::backup(&mut registry, output).await,
        Commands::Test { key, endpoint } => {
            commands::test(&mut registry, key, endpoint, output).await
        }
        Commands::Apply { file } => commands::apply(&mut registry, &file, output).await,
        Commands::Export { output: file } => commands::export(&registry, file.as_deref(), output),
        Commands::Shell => commands::shell::run(&mut registry, output).await,
    }
}
