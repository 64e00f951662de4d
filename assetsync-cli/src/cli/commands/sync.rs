//! sync command: validate, build, create, cache, tag, propagate and create variables

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use log::{info, warn};
use uuid::Uuid;

use super::{InputArgs, load_inputs, log_request_stats, print_report};
use crate::api::AssetServiceClient;
use crate::config::Config;
use crate::config::repository::{self, asset_cache};
use crate::hierarchy::{analyze, total_nodes};
use crate::pipeline::{PipelineOptions, PipelineReport, run_pipeline};
use crate::sync::LogProgressReporter;

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Assets per creation request (overrides sync.chunk_size)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Parent id for root assets (overrides sync.root_parent_id)
    #[arg(long)]
    pub root_parent_id: Option<String>,

    /// Creation requests in flight per level (overrides sync.chunk_concurrency)
    #[arg(long)]
    pub chunk_concurrency: Option<usize>,

    /// Skip leaf tagging and energy flag propagation
    #[arg(long)]
    pub no_energy: bool,

    /// Create data variables for tagged leaves through this adapter (overrides variables.adapter_id)
    #[arg(long)]
    pub adapter_id: Option<String>,

    /// JSON variable templates per energy type (overrides variables.templates)
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Create assets even if the cache shows an earlier run created them
    #[arg(long)]
    pub force: bool,

    /// Write the full result as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub async fn handle_sync_command(args: SyncArgs, mut config: Config) -> Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.sync.chunk_size = chunk_size;
    }
    if let Some(root) = &args.root_parent_id {
        config.sync.root_parent_id = root.clone();
    }
    if let Some(concurrency) = args.chunk_concurrency {
        config.sync.chunk_concurrency = concurrency;
    }
    if let Some(adapter_id) = &args.adapter_id {
        config.variables.adapter_id = Some(adapter_id.clone());
    }
    if let Some(templates) = &args.templates {
        config.variables.templates = Some(templates.clone());
    }
    config.validate()?;
    let options = PipelineOptions {
        sync: config.sync_options(),
        energy: (!args.no_energy).then(|| config.energy_options()),
        variables: config.variable_options()?,
    };

    let inputs = load_inputs(&args.input, &config)?;
    let analysis = analyze(&inputs.table, &inputs.builder);
    if analysis.has_errors() {
        print_report(&analysis);
        anyhow::bail!("Input has errors; run `assetsync validate` for details");
    }
    if analysis.warning_count() > 0 {
        warn!(
            "Input analysis found {} warning(s); run `assetsync validate` to review",
            analysis.warning_count()
        );
    }

    let levels = inputs.builder.build(&inputs.table.rows);
    if levels.is_empty() {
        println!("{}", "Nothing to synchronize: no rows produced any node".yellow());
        return Ok(());
    }

    let cache = match config.cache_path() {
        Some(path) => Some(repository::open(&path).await?),
        None => None,
    };

    if let Some(pool) = &cache {
        let external_ids: Vec<String> = levels
            .iter()
            .flat_map(|l| l.nodes.iter().map(|n| n.external_id.clone()))
            .collect();
        let existing = asset_cache::existing_external_ids(pool, &external_ids).await?;
        if !existing.is_empty() && !args.force {
            anyhow::bail!(
                "{} of {} assets were already created by an earlier run (e.g. '{}'); \
                 re-running may create duplicates. Inspect with `assetsync cache`, or pass --force",
                existing.len(),
                external_ids.len(),
                existing[0]
            );
        }
    }

    let (base_url, token) = config.credentials()?;
    let client = AssetServiceClient::new(base_url, token, &config.resilience())?;

    let run_id = Uuid::new_v4().to_string();
    println!(
        "Run {}: creating {} assets on {}",
        run_id.dimmed(),
        total_nodes(&levels).to_string().bold(),
        base_url.cyan()
    );

    let categories = inputs.builder.path_categories(&inputs.table.rows);
    let report = run_pipeline(
        &client,
        &run_id,
        &levels,
        &categories,
        &options,
        LogProgressReporter::new(run_id.as_str()),
    )
    .await;
    log_request_stats(&client);

    if let Some(pool) = &cache {
        match asset_cache::upsert_created_assets(pool, &run_id, &report.outcome.successes).await {
            Ok(count) => info!("[{}] Cached {} created assets", run_id, count),
            Err(e) => warn!("[{}] Failed to cache created assets: {:#}", run_id, e),
        }
    }

    print_summary(&report);

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }

    if !report.outcome.is_clean() {
        anyhow::bail!(
            "{} asset(s) failed to synchronize",
            report.outcome.failures.len()
        );
    }
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    let outcome = &report.outcome;

    println!();
    for level in &outcome.levels {
        println!(
            "  Level {}: {} created, {} failed ({} skipped)",
            level.level,
            level.created.to_string().bright_green(),
            level.failed.to_string().bright_red(),
            level.skipped
        );
    }

    println!(
        "\n{} {} created, {} failed",
        "Assets:".bold(),
        outcome.successes.len().to_string().bright_green(),
        outcome.failures.len().to_string().bright_red()
    );
    for (key, count) in outcome.failures_by_key() {
        println!("  {} x{}", key.red(), count);
    }
    for failure in outcome.failures.iter().take(10) {
        println!("  {}", failure.to_string().dimmed());
    }

    if let Some(tagging) = &report.tagging {
        println!(
            "{} {} tagged, {} failed",
            "Leaves:".bold(),
            tagging.succeeded,
            tagging.failures.len()
        );
    }
    if let Some(updates) = &report.flag_updates {
        println!(
            "{} {} updated, {} failed",
            "Energy flags:".bold(),
            updates.succeeded,
            updates.failures.len()
        );
    }
    if let Some(variables) = &report.variables {
        println!(
            "{} {} created, {} failed",
            "Variables:".bold(),
            variables.created,
            variables.failed()
        );
    }
}

fn write_report(path: &Path, report: &PipelineReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to encode sync report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    println!("Report written to {}", path.display().to_string().cyan());
    Ok(())
}
