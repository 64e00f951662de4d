//! validate command

use anyhow::Result;
use clap::Args;
use colored::*;

use super::{InputArgs, load_inputs, print_report};
use crate::config::Config;
use crate::hierarchy::analyze;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn handle_validate_command(args: ValidateArgs, config: &Config) -> Result<()> {
    let inputs = load_inputs(&args.input, config)?;
    println!("{} Mapping is valid", "✓".bright_green());

    let report = analyze(&inputs.table, &inputs.builder);
    print_report(&report);

    if report.has_errors() {
        anyhow::bail!("Validation found errors");
    }
    Ok(())
}
