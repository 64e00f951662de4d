//! suggest-mapping command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::mapping::{MappingValidator, suggest_mapping};
use crate::table::Table;

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    /// Table as JSON
    #[arg(long)]
    pub table: PathBuf,

    /// Write the mapping to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn handle_suggest_command(args: SuggestArgs) -> Result<()> {
    let table = Table::from_json_file(&args.table)?;
    let mapping = suggest_mapping(&table);
    let json = serde_json::to_string_pretty(&mapping).context("Failed to encode mapping")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
            eprintln!("Mapping written to {}", path.display().to_string().cyan());
        }
        None => println!("{}", json),
    }

    // The suggestion is only a starting point
    if let Err(errors) = MappingValidator::validate(&mapping) {
        eprintln!("{}", "Suggested mapping needs editing:".yellow());
        for message in errors.messages() {
            eprintln!("  {}", message.yellow());
        }
    }

    Ok(())
}
