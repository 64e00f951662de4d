//! Wire models for the asset service

use serde::{Deserialize, Serialize};

/// One entry of a bulk creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetToCreate {
    pub name: String,
    pub parent_id: String,
    /// Path key of the node; used to map results back to requests
    pub external_id: String,
}

/// Bulk creation response: successes and errors come back as separate lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkCreateResponse {
    #[serde(default)]
    pub results: Vec<ApiCreatedAsset>,
    #[serde(default)]
    pub errors: Vec<ApiBulkError>,
}

/// Success record as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCreatedAsset {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub has_children: Option<bool>,
}

/// Error record; `debugInfo.objectIndex` points into the submitted chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBulkError {
    #[serde(default)]
    pub error_key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub debug_info: Option<DebugInfo>,
}

impl ApiBulkError {
    pub fn object_index(&self) -> Option<usize> {
        self.debug_info.as_ref().and_then(|d| d.object_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    #[serde(default)]
    pub object_index: Option<usize>,
}

/// Key/value attribute attached to an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAttribute {
    pub key: String,
    pub value: String,
}

/// Asset as listed by the data service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AssetAttribute>,
}

impl Asset {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// One page of the asset listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsPage {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: usize,
}

/// Value type of a data variable, as named by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableDataType {
    Double,
    Boolean,
    String,
    Integer,
}

/// Data variable attached to an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    /// `/<adapterId>/<assetId>/<suffix>`
    pub topic: String,
    pub data_type: VariableDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub asset_id: String,
}
