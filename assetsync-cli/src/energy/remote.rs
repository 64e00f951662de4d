//! Leaf tagging and flag updates against the asset service
//!
//! Each call is independent: a failing asset is logged and reported, and the
//! remaining calls still run.

use std::collections::{BTreeMap, BTreeSet};

use futures::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;

use crate::api::{Asset, AssetApi};

use super::types::{EnergyFlags, EnergyMap, EnergyType};

/// A remote write that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFailure {
    pub asset_id: String,
    pub message: String,
}

/// Outcome of a batch of per-asset writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Vec<RemoteFailure>,
}

impl RemoteReport {
    fn record(&mut self, asset_id: &str, result: anyhow::Result<()>, what: &str) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) => {
                warn!("Failed to {} for asset {}: {}", what, asset_id, e);
                self.failures.push(RemoteFailure {
                    asset_id: asset_id.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Energy types of created leaves, taken from the categorical cell of their path.
///
/// `path_categories` maps a row's deepest path key to its raw categorical
/// value; paths are translated to server ids through `id_of_path`. Paths that
/// were not created or are not leaves are ignored.
pub fn leaf_energy_from_paths(
    path_categories: &BTreeMap<String, String>,
    id_of_path: &BTreeMap<String, String>,
    leaves: &BTreeSet<String>,
) -> EnergyMap {
    let mut energy = EnergyMap::new();

    for (path, raw) in path_categories {
        let Some(asset_id) = id_of_path.get(path) else {
            continue;
        };
        if !leaves.contains(asset_id) {
            debug!("Ignoring energy type on non-leaf '{}'", path);
            continue;
        }
        if let Some(kind) = EnergyType::normalize(raw) {
            energy.insert(asset_id.clone(), kind);
        }
    }

    energy
}

/// Energy types of listed leaves, read from their `attribute_key` attribute
pub fn leaf_energy_from_attributes(
    assets: &[Asset],
    leaves: &BTreeSet<String>,
    attribute_key: &str,
) -> EnergyMap {
    assets
        .iter()
        .filter(|a| leaves.contains(&a.id))
        .filter_map(|a| {
            let kind = EnergyType::normalize(a.attribute(attribute_key)?)?;
            Some((a.id.clone(), kind))
        })
        .collect()
}

/// Write each leaf's energy type as an attribute
pub async fn tag_leaves(
    api: &dyn AssetApi,
    energy: &EnergyMap,
    attribute_key: &str,
    concurrency: usize,
) -> RemoteReport {
    let mut report = RemoteReport::default();

    let mut results = futures::stream::iter(energy.iter())
        .map(|(asset_id, kind)| async move {
            let result = api.add_attribute(asset_id, attribute_key, kind.as_str()).await;
            (asset_id, result)
        })
        .buffered(concurrency.max(1));

    while let Some((asset_id, result)) = results.next().await {
        report.record(asset_id, result, "tag energy type");
    }

    info!(
        "Tagged {} leaves ({} failed)",
        report.succeeded,
        report.failures.len()
    );
    report
}

/// PATCH the propagated flags onto each ancestor; empty records are skipped
pub async fn apply_flags(
    api: &dyn AssetApi,
    flags: &BTreeMap<String, EnergyFlags>,
    concurrency: usize,
) -> RemoteReport {
    let mut report = RemoteReport {
        skipped: flags.values().filter(|f| f.is_empty()).count(),
        ..Default::default()
    };

    let mut results = futures::stream::iter(flags.iter().filter(|(_, f)| !f.is_empty()))
        .map(|(asset_id, record)| async move { (asset_id, api.update_flags(asset_id, record).await) })
        .buffered(concurrency.max(1));

    while let Some((asset_id, result)) = results.next().await {
        report.record(asset_id, result, "update energy flags");
    }

    info!(
        "Updated energy flags on {} assets ({} failed, {} without flags)",
        report.succeeded,
        report.failures.len(),
        report.skipped
    );
    report
}
