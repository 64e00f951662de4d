//! Result types of a synchronization run

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure taxonomy; serialized as its string code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorKey {
    /// Parent was never created, so the node was not submitted
    ParentAssetCreationFailed,
    /// Fewer success records than non-errored requests in a chunk
    MissingApiSuccessRecord,
    /// A success record that cannot be bound to a request
    MappingErrorOnSuccess,
    /// The whole chunk request failed in transport or with a server error
    NetworkOrServerError,
    /// The chunk response could not be decoded
    ChunkProcessingError,
    /// Per-item error record without an error key
    UnknownApiError,
    /// Error key reported by the service
    Remote(String),
}

impl ErrorKey {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKey::ParentAssetCreationFailed => "ParentAssetCreationFailed",
            ErrorKey::MissingApiSuccessRecord => "MissingApiSuccessRecord",
            ErrorKey::MappingErrorOnSuccess => "MappingErrorOnSuccess",
            ErrorKey::NetworkOrServerError => "NetworkOrServerError",
            ErrorKey::ChunkProcessingError => "ChunkProcessingError",
            ErrorKey::UnknownApiError => "UnknownApiError",
            ErrorKey::Remote(key) => key,
        }
    }
}

impl From<String> for ErrorKey {
    fn from(code: String) -> Self {
        match code.as_str() {
            "ParentAssetCreationFailed" => ErrorKey::ParentAssetCreationFailed,
            "MissingApiSuccessRecord" => ErrorKey::MissingApiSuccessRecord,
            "MappingErrorOnSuccess" => ErrorKey::MappingErrorOnSuccess,
            "NetworkOrServerError" => ErrorKey::NetworkOrServerError,
            "ChunkProcessingError" => ErrorKey::ChunkProcessingError,
            "UnknownApiError" => ErrorKey::UnknownApiError,
            _ => ErrorKey::Remote(code),
        }
    }
}

impl From<ErrorKey> for String {
    fn from(key: ErrorKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Asset confirmed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAsset {
    pub asset_id: String,
    pub name: String,
    /// Server id of the parent, or the root sentinel
    pub parent_id: String,
    /// Path key used in the creation request
    pub external_id: String,
}

/// Per-node failure, produced locally or by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssetError {
    pub error_key: ErrorKey,
    pub message: String,
    pub asset_name: String,
    pub asset_external_id: String,
    /// Position within the submitted chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_index: Option<usize>,
}

impl BulkAssetError {
    pub fn new(
        error_key: ErrorKey,
        message: impl Into<String>,
        asset_name: impl Into<String>,
        asset_external_id: impl Into<String>,
    ) -> Self {
        Self {
            error_key,
            message: message.into(),
            asset_name: asset_name.into(),
            asset_external_id: asset_external_id.into(),
            object_index: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.object_index = Some(index);
        self
    }
}

impl fmt::Display for BulkAssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = if self.asset_external_id.is_empty() {
            "<unknown asset>"
        } else {
            &self.asset_external_id
        };
        write!(f, "[{}] {}: {}", self.error_key, target, self.message)
    }
}

/// Counters for one level of the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReport {
    pub level: usize,
    /// Nodes sent to the service
    pub submitted: usize,
    /// Nodes not sent because their parent is missing
    pub skipped: usize,
    pub created: usize,
    /// Failures recorded while processing this level, skips included
    pub failed: usize,
}

/// Everything a synchronization run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub run_id: String,
    pub successes: Vec<CreatedAsset>,
    pub failures: Vec<BulkAssetError>,
    /// Path key to server id, for every confirmed node
    pub id_of_path: BTreeMap<String, String>,
    pub levels: Vec<LevelReport>,
}

impl SyncOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure counts grouped by error key
    pub fn failures_by_key(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.error_key.to_string()).or_insert(0) += 1;
        }
        counts
    }
}
