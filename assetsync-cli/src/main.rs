use anyhow::Result;
use clap::Parser;
use log::debug;

use assetsync::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up ASSETSYNC_* variables from a local .env file
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    debug!("assetsync {}", env!("CARGO_PKG_VERSION"));

    cli::run(args).await
}
