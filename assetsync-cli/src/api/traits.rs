//! Contract between the sync/energy engines and the asset service

use anyhow::Result;
use async_trait::async_trait;

use super::models::{AssetToCreate, AssetsPage, BulkCreateResponse, Variable};
use crate::energy::EnergyFlags;

/// Operations the core needs from the remote asset service.
///
/// Errors are whole-request failures; per-item failures of a bulk create come
/// back inside [`BulkCreateResponse`].
#[async_trait]
pub trait AssetApi: Send + Sync {
    /// Create one chunk of assets
    async fn bulk_create(&self, assets: &[AssetToCreate]) -> Result<BulkCreateResponse>;

    /// Create one chunk of data variables; the service reports no per-item results
    async fn bulk_create_variables(&self, variables: &[Variable]) -> Result<()>;

    /// Add a key/value attribute to an asset
    async fn add_attribute(&self, asset_id: &str, key: &str, value: &str) -> Result<()>;

    /// Write energy flags onto an asset
    async fn update_flags(&self, asset_id: &str, flags: &EnergyFlags) -> Result<()>;

    /// Fetch one page of the asset listing (1-based page number)
    async fn list_assets(&self, page: usize, page_size: usize) -> Result<AssetsPage>;
}
