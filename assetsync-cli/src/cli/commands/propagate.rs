//! propagate command: recompute energy flags from the hierarchy on the service

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use super::log_request_stats;
use crate::api::AssetServiceClient;
use crate::config::Config;
use crate::energy::{
    apply_flags, build_parent_map, identify_leaf_assets, leaf_energy_from_attributes,
    propagate_energy_types,
};

#[derive(Args, Debug, Clone)]
pub struct PropagateArgs {
    /// Compute and print flags without updating any asset
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_propagate_command(args: PropagateArgs, config: &Config) -> Result<()> {
    let (base_url, token) = config.credentials()?;
    let client = AssetServiceClient::new(base_url, token, &config.resilience())?;

    let assets = client
        .list_all_assets()
        .await
        .context("Failed to list assets")?;

    let leaves = identify_leaf_assets(&assets);
    let energy = leaf_energy_from_attributes(&assets, &leaves, &config.energy.attribute_key);
    let parents = build_parent_map(&assets, &config.sync.root_parent_id);
    let flags = propagate_energy_types(&energy, &parents);

    println!(
        "{} assets, {} leaves, {} with an energy type, {} ancestors to update",
        assets.len(),
        leaves.len(),
        energy.len(),
        flags.len()
    );

    if args.dry_run {
        let json = serde_json::to_string_pretty(&flags).context("Failed to encode flags")?;
        println!("{}", json);
        return Ok(());
    }

    let report = apply_flags(&client, &flags, config.energy.update_concurrency).await;
    log_request_stats(&client);
    println!(
        "{} {} updated, {} failed",
        "Energy flags:".bold(),
        report.succeeded.to_string().bright_green(),
        report.failures.len().to_string().bright_red()
    );
    for failure in &report.failures {
        println!("  {} {}", failure.asset_id.red(), failure.message.dimmed());
    }

    if !report.failures.is_empty() {
        anyhow::bail!("{} flag update(s) failed", report.failures.len());
    }
    Ok(())
}
