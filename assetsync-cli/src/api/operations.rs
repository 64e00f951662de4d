//! Request operations against the asset service

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{ASSETS_PATH, BULK_CREATE_PATH, VARIABLES_BULK_CREATE_PATH};
use super::models::{AssetToCreate, Variable};

/// A single HTTP operation the client can execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Create a chunk of assets in one request
    BulkCreate {
        /// Assets in submission order
        assets: Vec<AssetToCreate>,
    },
    /// Create a chunk of data variables in one request
    BulkCreateVariables { variables: Vec<Variable> },
    /// Attach a key/value attribute to an asset
    /// POST /assets/{id}/attributes with body {"key": ..., "value": ...}
    AddAttribute {
        asset_id: String,
        key: String,
        value: String,
    },
    /// Partially update an asset
    /// PATCH /assets/{id}
    UpdateAsset {
        asset_id: String,
        /// Fields to write as JSON
        data: Value,
    },
    /// Fetch one page of the asset listing
    ListAssets { page: usize, page_size: usize },
}

/// Result of executing an Operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    /// HTTP status code from the response
    pub status_code: u16,
    /// Decoded body, `Value::Null` when the body was empty
    pub data: Value,
}

impl Operation {
    /// Create a new BulkCreate operation
    pub fn bulk_create(assets: Vec<AssetToCreate>) -> Self {
        Self::BulkCreate { assets }
    }

    /// Create a new BulkCreateVariables operation
    pub fn bulk_create_variables(variables: Vec<Variable>) -> Self {
        Self::BulkCreateVariables { variables }
    }

    /// Create a new AddAttribute operation
    pub fn add_attribute(
        asset_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::AddAttribute {
            asset_id: asset_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a new UpdateAsset operation
    pub fn update_asset(asset_id: impl Into<String>, data: Value) -> Self {
        Self::UpdateAsset {
            asset_id: asset_id.into(),
            data,
        }
    }

    /// Create a new ListAssets operation
    pub fn list_assets(page: usize, page_size: usize) -> Self {
        Self::ListAssets { page, page_size }
    }

    /// Get the HTTP method for this operation
    pub fn http_method(&self) -> reqwest::Method {
        match self {
            Self::BulkCreate { .. } => reqwest::Method::POST,
            Self::BulkCreateVariables { .. } => reqwest::Method::POST,
            Self::AddAttribute { .. } => reqwest::Method::POST,
            Self::UpdateAsset { .. } => reqwest::Method::PATCH,
            Self::ListAssets { .. } => reqwest::Method::GET,
        }
    }

    /// Path relative to the service base URL
    pub fn path(&self) -> String {
        match self {
            Self::BulkCreate { .. } => BULK_CREATE_PATH.to_string(),
            Self::BulkCreateVariables { .. } => VARIABLES_BULK_CREATE_PATH.to_string(),
            Self::AddAttribute { asset_id, .. } => {
                format!("{}/{}/attributes", ASSETS_PATH, urlencoding::encode(asset_id))
            }
            Self::UpdateAsset { asset_id, .. } => {
                format!("{}/{}", ASSETS_PATH, urlencoding::encode(asset_id))
            }
            Self::ListAssets { page, page_size } => {
                format!("{}?page={}&pageSize={}", ASSETS_PATH, page, page_size)
            }
        }
    }

    /// JSON body, `None` for body-less requests
    pub fn body(&self) -> Result<Option<Value>> {
        let body = match self {
            Self::BulkCreate { assets } => {
                serde_json::to_value(assets).context("Failed to encode bulk create request")?
            }
            Self::BulkCreateVariables { variables } => serde_json::to_value(variables)
                .context("Failed to encode bulk variable request")?,
            Self::AddAttribute { key, value, .. } => {
                serde_json::json!({ "key": key, "value": value })
            }
            Self::UpdateAsset { data, .. } => data.clone(),
            Self::ListAssets { .. } => return Ok(None),
        };
        Ok(Some(body))
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::BulkCreate { .. } => "bulk_create",
            Self::BulkCreateVariables { .. } => "bulk_create_variables",
            Self::AddAttribute { .. } => "add_attribute",
            Self::UpdateAsset { .. } => "update_asset",
            Self::ListAssets { .. } => "list_assets",
        }
    }
}
