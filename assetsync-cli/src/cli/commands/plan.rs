//! plan command: the levels a sync would create, without network calls

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use super::{InputArgs, load_inputs};
use crate::config::Config;
use crate::hierarchy::total_nodes;

/// Nodes listed per level in text output
const PREVIEW_NODES: usize = 5;

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the full node list as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_plan_command(args: PlanArgs, config: &Config) -> Result<()> {
    let inputs = load_inputs(&args.input, config)?;
    let levels = inputs.builder.build(&inputs.table.rows);

    if args.json {
        let json = serde_json::to_string_pretty(&levels).context("Failed to encode plan")?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{} nodes across {} levels (chunk size {})",
        total_nodes(&levels).to_string().bold(),
        levels.len(),
        config.sync.chunk_size
    );

    for level in &levels {
        let chunks = level.len().div_ceil(config.sync.chunk_size.max(1));
        println!(
            "\n{} {} nodes, {} request(s)",
            format!("Level {}:", level.level).cyan().bold(),
            level.len(),
            chunks
        );
        for node in level.nodes.iter().take(PREVIEW_NODES) {
            println!("  {}", node.full_path);
        }
        if level.len() > PREVIEW_NODES {
            println!("  {}", format!("... and {} more", level.len() - PREVIEW_NODES).dimmed());
        }
    }

    Ok(())
}
