//! Command handlers

pub mod cache;
pub mod plan;
pub mod propagate;
pub mod suggest;
pub mod sync;
pub mod validate;
pub mod variables;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use log::info;

use crate::api::AssetServiceClient;
use crate::config::Config;
use crate::hierarchy::{AnalysisReport, HierarchyBuilder, Severity};
use crate::mapping::{MappingConfig, MappingValidator, ValidatedMapping};
use crate::table::Table;

/// Table and mapping inputs shared by several commands
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Table as JSON: {"headers": [...], "rows": [[...], ...]}
    #[arg(long)]
    pub table: PathBuf,

    /// Column mapping as JSON: {"columnMappings": {"<header>": {"type": "level", "level": 0}, ...}}
    #[arg(long)]
    pub mapping: PathBuf,
}

/// Parsed and validated inputs
pub struct Inputs {
    pub table: Table,
    pub mapping: ValidatedMapping,
    pub builder: HierarchyBuilder,
}

/// Read the table and mapping, validate the mapping and resolve its columns
pub fn load_inputs(args: &InputArgs, config: &Config) -> Result<Inputs> {
    let table = Table::from_json_file(&args.table)?;
    let raw = MappingConfig::from_json_file(&args.mapping)?;

    let mapping = match MappingValidator::validate(&raw) {
        Ok(mapping) => mapping,
        Err(errors) => {
            for message in errors.messages() {
                eprintln!("{} {}", "✗".bright_red(), message);
            }
            return Err(errors).context("Mapping validation failed");
        }
    };

    let builder =
        HierarchyBuilder::new(&mapping, &table)?.with_max_depth(config.sync.max_depth)?;

    Ok(Inputs {
        table,
        mapping,
        builder,
    })
}

/// Print analysis issues, errors in red and warnings in yellow
pub fn print_report(report: &AnalysisReport) {
    for issue in &report.issues {
        let line = issue.to_string();
        match issue.severity {
            Severity::Error => println!("  {}", line.bright_red()),
            Severity::Warning => println!("  {}", line.yellow()),
        }
    }

    let summary = report.summary();
    if report.has_errors() {
        println!("{}", summary.bright_red().bold());
    } else if report.issues.is_empty() {
        println!("{}", summary.bright_green());
    } else {
        println!("{}", summary.yellow());
    }
}

/// Log how many requests went out and how often they queued for a slot
pub fn log_request_stats(client: &AssetServiceClient) {
    let stats = client.limiter().stats();
    if stats.enabled {
        info!(
            "{} requests sent, {:.0}% waited for one of {} slots",
            stats.requests_acquired,
            stats.wait_rate() * 100.0,
            stats.max_concurrent_requests
        );
    } else {
        info!("{} requests sent (no concurrency limit)", stats.requests_acquired);
    }
}
