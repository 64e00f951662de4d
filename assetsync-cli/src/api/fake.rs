//! In-memory [`AssetApi`] used by tests
//!
//! Assigns ids `id-1`, `id-2`, ... in creation order, records every call, and
//! can be told to reject specific external ids, fail whole chunks, or replay
//! scripted bulk responses. Variable chunks are recorded the same way.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::error::ApiError;
use super::models::{
    ApiBulkError, ApiCreatedAsset, Asset, AssetToCreate, AssetsPage, BulkCreateResponse, DebugInfo,
    Variable,
};
use super::traits::AssetApi;
use crate::energy::EnergyFlags;

#[derive(Default)]
struct FakeState {
    next_id: usize,
    created: BTreeMap<String, String>,
    chunks: Vec<Vec<AssetToCreate>>,
    scripted: VecDeque<std::result::Result<BulkCreateResponse, ApiError>>,
    rejected_external_ids: HashSet<String>,
    failing_chunk_markers: HashSet<String>,
    failing_asset_ids: HashSet<String>,
    variable_chunks: Vec<Vec<Variable>>,
    failing_variable_assets: HashSet<String>,
    attributes: Vec<(String, String, String)>,
    updates: Vec<(String, EnergyFlags)>,
    listed: Vec<Asset>,
    list_calls: usize,
}

#[derive(Default)]
pub struct FakeAssetApi {
    state: Mutex<FakeState>,
}

impl FakeAssetApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a per-item error for this external id
    pub fn reject(&self, external_id: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_external_ids
            .insert(external_id.to_string());
    }

    /// Fail the whole request for any chunk containing this external id
    pub fn fail_chunk_containing(&self, external_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_chunk_markers
            .insert(external_id.to_string());
    }

    /// Queue a canned reply for the next bulk create call
    pub fn script(&self, reply: std::result::Result<BulkCreateResponse, ApiError>) {
        self.state.lock().unwrap().scripted.push_back(reply);
    }

    /// Make attribute and flag writes for this asset id fail
    pub fn fail_asset(&self, asset_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_asset_ids
            .insert(asset_id.to_string());
    }

    /// Fail any variable chunk carrying a variable of this asset
    pub fn fail_variables_for(&self, asset_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_variable_assets
            .insert(asset_id.to_string());
    }

    pub fn push_listed(&self, asset: Asset) {
        self.state.lock().unwrap().listed.push(asset);
    }

    pub fn chunks(&self) -> Vec<Vec<AssetToCreate>> {
        self.state.lock().unwrap().chunks.clone()
    }

    /// Every external id submitted across all chunks
    pub fn submitted_external_ids(&self) -> Vec<String> {
        self.chunks()
            .into_iter()
            .flatten()
            .map(|a| a.external_id)
            .collect()
    }

    pub fn created_id(&self, external_id: &str) -> Option<String> {
        self.state.lock().unwrap().created.get(external_id).cloned()
    }

    /// Variable chunks in submission order, failed ones included
    pub fn variable_chunks(&self) -> Vec<Vec<Variable>> {
        self.state.lock().unwrap().variable_chunks.clone()
    }

    pub fn attributes(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().attributes.clone()
    }

    pub fn updates(&self) -> Vec<(String, EnergyFlags)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }
}

#[async_trait]
impl AssetApi for FakeAssetApi {
    async fn bulk_create(&self, assets: &[AssetToCreate]) -> Result<BulkCreateResponse> {
        let mut state = self.state.lock().unwrap();
        state.chunks.push(assets.to_vec());

        if let Some(reply) = state.scripted.pop_front() {
            return reply.map_err(Into::into);
        }

        if assets
            .iter()
            .any(|a| state.failing_chunk_markers.contains(&a.external_id))
        {
            return Err(ApiError::Transport("connection reset".to_string()).into());
        }

        let mut response = BulkCreateResponse::default();
        for (index, asset) in assets.iter().enumerate() {
            if state.rejected_external_ids.contains(&asset.external_id) {
                response.errors.push(ApiBulkError {
                    error_key: Some("DuplicateName".to_string()),
                    message: Some(format!("'{}' already exists", asset.name)),
                    debug_info: Some(DebugInfo {
                        object_index: Some(index),
                    }),
                });
                continue;
            }

            state.next_id += 1;
            let id = format!("id-{}", state.next_id);
            state.created.insert(asset.external_id.clone(), id.clone());
            response.results.push(ApiCreatedAsset {
                asset_id: Some(id),
                name: Some(asset.name.clone()),
                parent_id: Some(asset.parent_id.clone()),
                sort_order: Some(index as i64),
                has_children: Some(false),
            });
        }

        Ok(response)
    }

    async fn bulk_create_variables(&self, variables: &[Variable]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.variable_chunks.push(variables.to_vec());

        if variables
            .iter()
            .any(|v| state.failing_variable_assets.contains(&v.asset_id))
        {
            return Err(ApiError::Status {
                status: 500,
                error_key: None,
                message: "variable service unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn add_attribute(&self, asset_id: &str, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_asset_ids.contains(asset_id) {
            return Err(ApiError::Status {
                status: 404,
                error_key: Some("NotFound".to_string()),
                message: format!("asset {} not found", asset_id),
            }
            .into());
        }
        state
            .attributes
            .push((asset_id.to_string(), key.to_string(), value.to_string()));
        Ok(())
    }

    async fn update_flags(&self, asset_id: &str, flags: &EnergyFlags) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_asset_ids.contains(asset_id) {
            return Err(ApiError::Transport("timed out".to_string()).into());
        }
        state.updates.push((asset_id.to_string(), flags.clone()));
        Ok(())
    }

    async fn list_assets(&self, page: usize, page_size: usize) -> Result<AssetsPage> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        let start = page.saturating_sub(1) * page_size;
        let assets = state
            .listed
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Ok(AssetsPage {
            assets,
            total: state.listed.len(),
            page,
            page_size,
        })
    }
}
