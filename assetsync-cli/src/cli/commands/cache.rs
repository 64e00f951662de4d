//! cache command: inspect assets recorded by earlier runs

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::config::Config;
use crate::config::repository::{self, asset_cache};

#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Show a single asset by external id (path key, e.g. "Plant1@AreaA")
    #[arg(long)]
    pub external_id: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_cache_command(args: CacheArgs, config: &Config) -> Result<()> {
    let path = config
        .cache_path()
        .context("The asset cache is disabled (cache.enabled = false)")?;
    let pool = repository::open(&path).await?;

    let assets: Vec<asset_cache::CachedAsset> = match &args.external_id {
        Some(external_id) => asset_cache::get_by_external_id(&pool, external_id)
            .await?
            .into_iter()
            .collect(),
        None => asset_cache::list(&pool).await?,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&assets).context("Failed to encode cache")?;
        println!("{}", json);
        return Ok(());
    }

    if assets.is_empty() {
        println!("{}", "No cached assets".dimmed());
        return Ok(());
    }

    for asset in &assets {
        println!(
            "{}  {}  {}  {}",
            asset.external_id.cyan(),
            asset.asset_id,
            asset.run_id.dimmed(),
            asset.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!("{} cached assets in {}", assets.len(), path.display());

    Ok(())
}
