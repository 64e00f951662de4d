//! Created-asset cache repository
//!
//! Remembers which external ids earlier runs created, so an operator can see
//! what already exists on the service before re-running a sync.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::sync::CreatedAsset;

/// A created asset as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAsset {
    pub external_id: String,
    pub asset_id: String,
    pub name: String,
    pub parent_id: String,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
}

type CachedRow = (String, String, String, String, String, DateTime<Utc>);

impl From<CachedRow> for CachedAsset {
    fn from(row: CachedRow) -> Self {
        let (external_id, asset_id, name, parent_id, run_id, created_at) = row;
        Self {
            external_id,
            asset_id,
            name,
            parent_id,
            run_id,
            created_at,
        }
    }
}

/// Create the cache table if needed
pub async fn init(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS created_assets (
            external_id TEXT PRIMARY KEY NOT NULL,
            asset_id TEXT NOT NULL,
            name TEXT NOT NULL,
            parent_id TEXT NOT NULL,
            run_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create created_assets table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_created_assets_run ON created_assets (run_id)")
        .execute(pool)
        .await
        .context("Failed to create created_assets index")?;

    Ok(())
}

/// Store the assets of a run, replacing earlier rows with the same external id
pub async fn upsert_created_assets(
    pool: &SqlitePool,
    run_id: &str,
    assets: &[CreatedAsset],
) -> Result<usize> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    for asset in assets {
        sqlx::query(
            "INSERT INTO created_assets (external_id, asset_id, name, parent_id, run_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(external_id) DO UPDATE SET
                asset_id = excluded.asset_id,
                name = excluded.name,
                parent_id = excluded.parent_id,
                run_id = excluded.run_id,
                created_at = excluded.created_at",
        )
        .bind(&asset.external_id)
        .bind(&asset.asset_id)
        .bind(&asset.name)
        .bind(&asset.parent_id)
        .bind(run_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to cache asset '{}'", asset.external_id))?;
    }

    tx.commit().await.context("Failed to commit asset cache")?;
    Ok(assets.len())
}

/// Look up a cached asset by external id (path key)
pub async fn get_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Option<CachedAsset>> {
    let row: Option<CachedRow> = sqlx::query_as(
        "SELECT external_id, asset_id, name, parent_id, run_id, created_at
         FROM created_assets WHERE external_id = ?",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get cached asset")?;

    Ok(row.map(CachedAsset::from))
}

/// All cached assets ordered by external id
pub async fn list(pool: &SqlitePool) -> Result<Vec<CachedAsset>> {
    let rows: Vec<CachedRow> = sqlx::query_as(
        "SELECT external_id, asset_id, name, parent_id, run_id, created_at
         FROM created_assets ORDER BY external_id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list cached assets")?;

    Ok(rows.into_iter().map(CachedAsset::from).collect())
}

/// Which of `external_ids` are already cached
pub async fn existing_external_ids(
    pool: &SqlitePool,
    external_ids: &[String],
) -> Result<Vec<String>> {
    let mut existing = Vec::new();
    for external_id in external_ids {
        if get_by_external_id(pool, external_id).await?.is_some() {
            existing.push(external_id.clone());
        }
    }
    Ok(existing)
}
