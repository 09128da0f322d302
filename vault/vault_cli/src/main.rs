use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vault_core::{LogLevel, VaultConfig};

mod commands;
mod logging;

use commands::demo::DemoArgs;
use commands::scenario::ScenarioArgs;
use commands::status::StatusArgs;

/// Vault Command Line Interface
///
/// Drives a pool of safety deposit boxes: run contention scenarios,
/// allocate boxes for customers, and inspect the configured pool.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run threads that each acquire, hold and release a box
    Scenario(ScenarioArgs),

    /// Allocate boxes to customers in turn, then release them
    Demo(DemoArgs),

    /// Show the configured pool
    Status(StatusArgs),
}

fn load_config(path: Option<&PathBuf>) -> Result<VaultConfig> {
    match path {
        Some(path) => VaultConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(VaultConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    logging::init(cli.log_level.unwrap_or(config.log_level))?;

    match cli.command {
        Commands::Scenario(args) => commands::scenario::execute(&args, &config),
        Commands::Demo(args) => commands::demo::execute(&args, &config),
        Commands::Status(args) => commands::status::execute(&args, &config),
    }
}
