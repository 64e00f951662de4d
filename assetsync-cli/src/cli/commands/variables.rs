//! variables command: create data variables for tagged leaves already on the service

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use super::log_request_stats;
use crate::api::AssetServiceClient;
use crate::config::Config;
use crate::energy::{
    build_variables, create_variables, identify_leaf_assets, leaf_energy_from_attributes,
};

#[derive(Args, Debug, Clone)]
pub struct VariablesArgs {
    /// Adapter the variable topics are routed through (overrides variables.adapter_id)
    #[arg(long)]
    pub adapter_id: Option<String>,

    /// JSON variable templates per energy type (overrides variables.templates)
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Print the variables as JSON without creating them
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_variables_command(args: VariablesArgs, mut config: Config) -> Result<()> {
    if let Some(adapter_id) = args.adapter_id {
        config.variables.adapter_id = Some(adapter_id);
    }
    if let Some(templates) = args.templates {
        config.variables.templates = Some(templates);
    }
    let options = config
        .variable_options()?
        .context("No adapter configured (pass --adapter-id or set variables.adapter_id)")?;

    let (base_url, token) = config.credentials()?;
    let client = AssetServiceClient::new(base_url, token, &config.resilience())?;

    let assets = client
        .list_all_assets()
        .await
        .context("Failed to list assets")?;
    let leaves = identify_leaf_assets(&assets);
    let energy = leaf_energy_from_attributes(&assets, &leaves, &config.energy.attribute_key);
    let variables = build_variables(&assets, &energy, &options.adapter_id, &options.templates);

    println!(
        "{} leaves with an energy type, {} variables via adapter {}",
        energy.len(),
        variables.len(),
        options.adapter_id.cyan()
    );

    if args.dry_run {
        let json =
            serde_json::to_string_pretty(&variables).context("Failed to encode variables")?;
        println!("{}", json);
        return Ok(());
    }

    let report = create_variables(
        &client,
        &variables,
        options.chunk_size,
        options.chunk_concurrency,
    )
    .await;
    log_request_stats(&client);

    println!(
        "{} {} created, {} failed",
        "Variables:".bold(),
        report.created.to_string().bright_green(),
        report.failed().to_string().bright_red()
    );
    for failure in &report.failures {
        println!(
            "  chunk {} ({} variables): {}",
            failure.chunk + 1,
            failure.size,
            failure.message.dimmed()
        );
    }

    if !report.failures.is_empty() {
        anyhow::bail!("{} variable chunk(s) failed", report.failures.len());
    }
    Ok(())
}
