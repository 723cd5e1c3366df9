//! Operator CLI for the PAI security policy.
//!
//! Prints decisions as JSON and exits 0 (allow), 1 (ask) or 2 (deny), so it can
//! be used from shell scripts to verify the policy tables.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

use pai_plugin::config::PluginConfig;
use pai_plugin::error::PaiError;
use pai_plugin::paths::HistoryLayout;
use pai_plugin::security::{AccessMode, DecisionStatus, PolicyEngine, SecurityDecision};

#[derive(Debug, Parser)]
#[command(name = "pai_policy", about = "Check commands and paths against the PAI policy")]
struct Args {
    /// PAI configuration root (defaults to PAI_DIR, then ~/.config/opencode)
    #[arg(long, env = "PAI_DIR", global = true)]
    pai_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a shell command
    CheckCommand {
        /// Command text; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Classify a file access
    CheckPath {
        path: String,

        #[arg(long, value_enum, default_value_t = Mode::Read)]
        mode: Mode,
    },
    /// Create the PAI directory structure and report what was created
    Init,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Read,
    Write,
}

impl From<Mode> for AccessMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Read => AccessMode::Read,
            Mode::Write => AccessMode::Write,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, PaiError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pai_plugin=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = PluginConfig::from_env();
    if let Some(dir) = args.pai_dir {
        config.pai_dir = dir;
    }

    match args.command {
        Command::CheckCommand { command } => {
            let engine = PolicyEngine::for_config_root(&config.pai_dir);
            let decision = engine.validate_command(&command.join(" "));
            report(&decision)
        }
        Command::CheckPath { path, mode } => {
            let engine = PolicyEngine::for_config_root(&config.pai_dir);
            let decision = engine.validate_path(&path, mode.into());
            report(&decision)
        }
        Command::Init => {
            let layout = HistoryLayout::new(config.pai_dir.clone());
            let created = layout.ensure_structure();
            let report = json!({
                "pai_dir": layout.pai_dir(),
                "created": created,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report(decision: &SecurityDecision) -> Result<ExitCode, PaiError> {
    println!("{}", serde_json::to_string_pretty(decision)?);
    Ok(ExitCode::from(match decision.status {
        DecisionStatus::Allow => 0,
        DecisionStatus::Ask => 1,
        DecisionStatus::Deny => 2,
    }))
}
