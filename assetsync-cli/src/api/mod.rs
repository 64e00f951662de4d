//! Remote asset service API
//!
//! Wire models, the [`AssetApi`] seam used by the synchronizer and the energy
//! engine, and the reqwest-backed [`AssetServiceClient`].

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod operations;
pub mod resilience;
pub mod traits;

#[cfg(test)]
pub mod fake;

pub use client::AssetServiceClient;
pub use error::ApiError;
pub use models::{
    ApiBulkError, ApiCreatedAsset, Asset, AssetAttribute, AssetToCreate, AssetsPage,
    BulkCreateResponse, DebugInfo, Variable, VariableDataType,
};
pub use operations::{Operation, OperationResult};
pub use resilience::{ConcurrencyConfig, ConcurrencyLimiter, ConcurrencyStats, ResilienceConfig};
pub use traits::AssetApi;
