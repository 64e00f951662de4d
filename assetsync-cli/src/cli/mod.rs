//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use commands::cache::CacheArgs;
use commands::plan::PlanArgs;
use commands::propagate::PropagateArgs;
use commands::suggest::SuggestArgs;
use commands::sync::SyncArgs;
use commands::validate::ValidateArgs;
use commands::variables::VariablesArgs;

#[derive(Parser)]
#[command(
    name = "assetsync",
    about = "Build an asset hierarchy from tabular rows and synchronize it to the asset service",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to config file (defaults to <config_dir>/assetsync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Suggest a column mapping from the table headers
    SuggestMapping(SuggestArgs),

    /// Validate a mapping and analyze the table without contacting the service
    Validate(ValidateArgs),

    /// Show the levels and nodes that a sync would create
    Plan(PlanArgs),

    /// Create the hierarchy on the asset service, propagate energy flags and create variables
    Sync(SyncArgs),

    /// Recompute energy flags for the hierarchy already on the service
    Propagate(PropagateArgs),

    /// Create data variables for tagged leaves already on the service
    Variables(VariablesArgs),

    /// Inspect assets recorded by earlier sync runs
    Cache(CacheArgs),
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::SuggestMapping(args) => commands::suggest::handle_suggest_command(args),
        Commands::Validate(args) => {
            let config = Config::load(config_path)?;
            commands::validate::handle_validate_command(args, &config)
        }
        Commands::Plan(args) => {
            let config = Config::load(config_path)?;
            commands::plan::handle_plan_command(args, &config)
        }
        Commands::Sync(args) => {
            let config = Config::load(config_path)?;
            commands::sync::handle_sync_command(args, config).await
        }
        Commands::Propagate(args) => {
            let config = Config::load(config_path)?;
            commands::propagate::handle_propagate_command(args, &config).await
        }
        Commands::Variables(args) => {
            let config = Config::load(config_path)?;
            commands::variables::handle_variables_command(args, config).await
        }
        Commands::Cache(args) => {
            let config = Config::load(config_path)?;
            commands::cache::handle_cache_command(args, &config).await
        }
    }
}
