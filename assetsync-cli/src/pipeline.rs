//! A complete sync run
//!
//! Creates the hierarchy level by level, then works only on what was actually
//! created: leaves are tagged with their energy type, flags are propagated to
//! every ancestor, and data variables are created for tagged leaves.

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::api::AssetApi;
use crate::energy::{
    EnergyFlags, RemoteReport, VariableReport, VariableTemplates, apply_flags, build_parent_map,
    build_variables, create_variables, identify_leaf_assets, leaf_energy_from_paths,
    propagate_energy_types, tag_leaves,
};
use crate::hierarchy::AssetLevel;
use crate::sync::{LevelSynchronizer, SyncOptions, SyncOutcome, SyncProgressReporter};

/// Leaf tagging and flag propagation settings
#[derive(Debug, Clone)]
pub struct EnergyOptions {
    pub attribute_key: String,
    pub update_concurrency: usize,
}

/// Variable creation settings
#[derive(Debug, Clone)]
pub struct VariableOptions {
    pub adapter_id: String,
    pub templates: VariableTemplates,
    pub chunk_size: usize,
    pub chunk_concurrency: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub sync: SyncOptions,
    /// `None` skips tagging and propagation
    pub energy: Option<EnergyOptions>,
    /// `None` skips variable creation
    pub variables: Option<VariableOptions>,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagging: Option<RemoteReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_updates: Option<RemoteReport>,
    pub energy_flags: BTreeMap<String, EnergyFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<VariableReport>,
}

/// Run creation and every follow-up phase.
///
/// `path_categories` maps a row's deepest path key to its raw categorical
/// value. Like the synchronizer, this never fails as a whole; each phase
/// reports its own failures.
pub async fn run_pipeline<'a>(
    api: &'a dyn AssetApi,
    run_id: &str,
    levels: &[AssetLevel],
    path_categories: &BTreeMap<String, String>,
    options: &PipelineOptions,
    reporter: impl SyncProgressReporter + 'a,
) -> PipelineReport {
    let outcome = LevelSynchronizer::new(api, options.sync.clone())
        .with_reporter(reporter)
        .synchronize_run(run_id, levels)
        .await;

    let leaves = identify_leaf_assets(&outcome.successes);
    let energy = leaf_energy_from_paths(path_categories, &outcome.id_of_path, &leaves);
    info!(
        "[{}] {} created leaves, {} with an energy type",
        run_id,
        leaves.len(),
        energy.len()
    );

    let mut report = PipelineReport {
        outcome,
        tagging: None,
        flag_updates: None,
        energy_flags: BTreeMap::new(),
        variables: None,
    };

    if let Some(energy_options) = &options.energy {
        report.tagging = Some(
            tag_leaves(
                api,
                &energy,
                &energy_options.attribute_key,
                energy_options.update_concurrency,
            )
            .await,
        );

        let parents = build_parent_map(&report.outcome.successes, &options.sync.root_parent_id);
        report.energy_flags = propagate_energy_types(&energy, &parents);
        report.flag_updates = Some(
            apply_flags(api, &report.energy_flags, energy_options.update_concurrency).await,
        );
    }

    if let Some(variable_options) = &options.variables {
        let variables = build_variables(
            &report.outcome.successes,
            &energy,
            &variable_options.adapter_id,
            &variable_options.templates,
        );
        report.variables = Some(
            create_variables(
                api,
                &variables,
                variable_options.chunk_size,
                variable_options.chunk_concurrency,
            )
            .await,
        );
    }

    report
}
