//! Level-ordered bulk creation
//!
//! Levels are created strictly one after another. Within a level, resolvable
//! nodes are split into chunks that may be dispatched with bounded
//! concurrency; chunk outcomes are merged in request order by this task only,
//! so `id_of_path` is complete for a level before the next one starts.

use std::collections::BTreeMap;

use futures::StreamExt;
use log::{error, info, warn};

use crate::api::constants::DEFAULT_ROOT_PARENT_ID;
use crate::api::{AssetApi, AssetToCreate};
use crate::hierarchy::{AssetLevel, total_nodes};

use super::progress::{NoopProgressReporter, SyncProgressReporter};
use super::reconcile::{ChunkOutcome, fail_chunk, reconcile_chunk};
use super::types::{BulkAssetError, ErrorKey, LevelReport, SyncOutcome};

/// Default number of assets per creation request
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Options for a synchronization run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum assets per creation request
    pub chunk_size: usize,
    /// Parent id sent for level-0 nodes
    pub root_parent_id: String,
    /// Chunks of one level in flight at once
    pub chunk_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            root_parent_id: DEFAULT_ROOT_PARENT_ID.to_string(),
            chunk_concurrency: 1,
        }
    }
}

/// Creates a leveled hierarchy on the asset service, parents first
pub struct LevelSynchronizer<'a> {
    api: &'a dyn AssetApi,
    options: SyncOptions,
    reporter: Box<dyn SyncProgressReporter + 'a>,
}

impl<'a> LevelSynchronizer<'a> {
    pub fn new(api: &'a dyn AssetApi, options: SyncOptions) -> Self {
        Self {
            api,
            options,
            reporter: Box::new(NoopProgressReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: impl SyncProgressReporter + 'a) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Synchronize every level in increasing depth order.
    ///
    /// Never fails as a whole: per-node and per-chunk problems end up in
    /// `SyncOutcome::failures`, and nothing that succeeded is rolled back.
    pub async fn synchronize_run(&self, run_id: &str, levels: &[AssetLevel]) -> SyncOutcome {
        let mut ordered: Vec<&AssetLevel> = levels.iter().collect();
        ordered.sort_by_key(|level| level.level);

        info!(
            "[{}] Synchronizing {} nodes across {} levels (chunk size {})",
            run_id,
            total_nodes(levels),
            ordered.len(),
            self.options.chunk_size
        );

        let mut outcome = SyncOutcome {
            run_id: run_id.to_string(),
            ..Default::default()
        };

        for level in ordered {
            let report = self.sync_level(run_id, level, &mut outcome).await;
            self.reporter.level_finished(&report);
            outcome.levels.push(report);
        }

        info!(
            "[{}] Synchronization finished: {} created, {} failed",
            run_id,
            outcome.successes.len(),
            outcome.failures.len()
        );

        outcome
    }

    async fn sync_level(
        &self,
        run_id: &str,
        level: &AssetLevel,
        outcome: &mut SyncOutcome,
    ) -> LevelReport {
        let mut report = LevelReport {
            level: level.level,
            ..Default::default()
        };

        let requests = self.resolve_parents(run_id, level, &outcome.id_of_path, &mut outcome.failures);
        report.skipped = level.len() - requests.len();
        report.failed = report.skipped;
        report.submitted = requests.len();

        let chunk_size = self.options.chunk_size.max(1);
        let chunks: Vec<&[AssetToCreate]> = requests.chunks(chunk_size).collect();
        self.reporter
            .level_started(level.level, requests.len(), chunks.len());

        let mut results = futures::stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move { (index, chunk, self.api.bulk_create(chunk).await) })
            .buffered(self.options.chunk_concurrency.max(1));

        while let Some((index, chunk, result)) = results.next().await {
            let chunk_outcome = match result {
                Ok(response) => reconcile_chunk(chunk, response),
                Err(e) => {
                    error!(
                        "[{}] Level {} chunk {} failed ({} assets): {}",
                        run_id,
                        level.level,
                        index,
                        chunk.len(),
                        e
                    );
                    ChunkOutcome {
                        created: Vec::new(),
                        failures: fail_chunk(chunk, &e),
                    }
                }
            };

            self.reporter.chunk_finished(
                level.level,
                index,
                chunk_outcome.created.len(),
                chunk_outcome.failures.len(),
            );

            report.created += chunk_outcome.created.len();
            report.failed += chunk_outcome.failures.len();
            merge_chunk(outcome, chunk_outcome);
        }

        report
    }

    /// Build creation requests for nodes whose parent exists; record the rest
    fn resolve_parents(
        &self,
        run_id: &str,
        level: &AssetLevel,
        id_of_path: &BTreeMap<String, String>,
        failures: &mut Vec<BulkAssetError>,
    ) -> Vec<AssetToCreate> {
        let mut requests = Vec::with_capacity(level.len());

        for node in &level.nodes {
            let parent_id = match &node.parent_path {
                None => self.options.root_parent_id.clone(),
                Some(parent_path) => match id_of_path.get(parent_path) {
                    Some(id) => id.clone(),
                    None => {
                        warn!(
                            "[{}] Skipping '{}': parent '{}' was not created",
                            run_id, node.full_path, parent_path
                        );
                        failures.push(BulkAssetError::new(
                            ErrorKey::ParentAssetCreationFailed,
                            format!("Parent asset '{}' was not created", parent_path),
                            &node.name,
                            &node.external_id,
                        ));
                        continue;
                    }
                },
            };

            requests.push(AssetToCreate {
                name: node.name.clone(),
                parent_id,
                external_id: node.external_id.clone(),
            });
        }

        requests
    }
}

fn merge_chunk(outcome: &mut SyncOutcome, chunk: ChunkOutcome) {
    for created in chunk.created {
        outcome
            .id_of_path
            .insert(created.external_id.clone(), created.asset_id.clone());
        outcome.successes.push(created);
    }
    outcome.failures.extend(chunk.failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BulkCreateResponse;
    use crate::api::fake::FakeAssetApi;
    use crate::hierarchy::AssetNode;

    /// Levels for the Plant1 / AreaA / AreaB example
    fn plant_levels() -> Vec<AssetLevel> {
        let paths: Vec<Vec<&str>> = vec![
            vec!["Plant1"],
            vec!["Plant1", "AreaA"],
            vec!["Plant1", "AreaB"],
            vec!["Plant1", "AreaA", "Pump1"],
            vec!["Plant1", "AreaA", "Pump2"],
            vec!["Plant1", "AreaB", "Fan1"],
        ];

        let mut levels: Vec<AssetLevel> = (0..3).map(AssetLevel::new).collect();
        for segments in paths {
            let node = AssetNode::from_segments(&segments);
            levels[node.level()].nodes.push(node);
        }
        levels
    }

    fn options(chunk_size: usize) -> SyncOptions {
        SyncOptions {
            chunk_size,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_all_nodes_created() {
        let api = FakeAssetApi::new();
        let outcome = LevelSynchronizer::new(&api, SyncOptions::default())
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert_eq!(outcome.successes.len(), 6);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.id_of_path.len(), 6);
        assert_eq!(outcome.run_id, "run-1");

        let plant_id = outcome.id_of_path["Plant1"].clone();
        let area_a = outcome
            .successes
            .iter()
            .find(|a| a.external_id == "Plant1@AreaA")
            .unwrap();
        assert_eq!(area_a.parent_id, plant_id);

        let root = &outcome.successes[0];
        assert_eq!(root.parent_id, "0");
        assert_eq!(api.chunks().len(), 3);
    }

    #[tokio::test]
    async fn test_root_failure_cascades_without_submitting_descendants() {
        let api = FakeAssetApi::new();
        api.reject("Plant1");

        let outcome = LevelSynchronizer::new(&api, SyncOptions::default())
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert!(outcome.successes.is_empty());
        assert_eq!(outcome.failures.len(), 6);
        assert_eq!(
            outcome.failures[0].error_key,
            ErrorKey::Remote("DuplicateName".to_string())
        );
        assert!(
            outcome.failures[1..]
                .iter()
                .all(|f| f.error_key == ErrorKey::ParentAssetCreationFailed)
        );

        assert_eq!(api.submitted_external_ids(), vec!["Plant1".to_string()]);
        assert_eq!(outcome.levels[1].skipped, 2);
        assert_eq!(outcome.levels[2].skipped, 3);
        assert_eq!(outcome.levels[2].submitted, 0);
    }

    #[tokio::test]
    async fn test_level_split_into_chunks() {
        let api = FakeAssetApi::new();
        let mut levels = plant_levels();
        // Three siblings at level 1 so a chunk size of 2 produces a short chunk
        levels[1]
            .nodes
            .push(AssetNode::from_segments(&["Plant1", "AreaC"]));

        let outcome = LevelSynchronizer::new(&api, options(2))
            .synchronize_run("run-1", &levels)
            .await;

        let sizes: Vec<usize> = api.chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 2, 1, 2, 1]);
        assert_eq!(outcome.successes.len(), 7);
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_whole_chunk_failure_is_isolated() {
        let api = FakeAssetApi::new();
        api.fail_chunk_containing("Plant1@AreaB");

        let outcome = LevelSynchronizer::new(&api, options(1))
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert_eq!(outcome.successes.len(), 4);
        let keys: Vec<(&str, &ErrorKey)> = outcome
            .failures
            .iter()
            .map(|f| (f.asset_external_id.as_str(), &f.error_key))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Plant1@AreaB", &ErrorKey::NetworkOrServerError),
                ("Plant1@AreaB@Fan1", &ErrorKey::ParentAssetCreationFailed),
            ]
        );
        assert!(outcome.id_of_path.contains_key("Plant1@AreaA@Pump2"));
    }

    #[tokio::test]
    async fn test_missing_success_record_blocks_children() {
        let api = FakeAssetApi::new();
        api.script(Ok(BulkCreateResponse::default()));

        let outcome = LevelSynchronizer::new(&api, SyncOptions::default())
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert!(outcome.successes.is_empty());
        assert_eq!(outcome.failures[0].error_key, ErrorKey::MissingApiSuccessRecord);
        assert_eq!(outcome.failures[0].object_index, Some(0));
        assert_eq!(outcome.failures.len(), 6);
    }

    #[tokio::test]
    async fn test_concurrent_chunks_merge_in_request_order() {
        let api = FakeAssetApi::new();
        let opts = SyncOptions {
            chunk_size: 1,
            chunk_concurrency: 4,
            ..Default::default()
        };

        let outcome = LevelSynchronizer::new(&api, opts)
            .synchronize_run("run-1", &plant_levels())
            .await;

        let order: Vec<&str> = outcome
            .successes
            .iter()
            .map(|a| a.external_id.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "Plant1",
                "Plant1@AreaA",
                "Plant1@AreaB",
                "Plant1@AreaA@Pump1",
                "Plant1@AreaA@Pump2",
                "Plant1@AreaB@Fan1",
            ]
        );
    }

    #[tokio::test]
    async fn test_configured_root_parent_id() {
        let api = FakeAssetApi::new();
        let opts = SyncOptions {
            root_parent_id: "site-42".to_string(),
            ..Default::default()
        };

        let outcome = LevelSynchronizer::new(&api, opts)
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert_eq!(outcome.run_id, "run-1");
        assert_eq!(api.chunks()[0][0].parent_id, "site-42");
    }

    #[tokio::test]
    async fn test_level_reports() {
        let api = FakeAssetApi::new();
        api.reject("Plant1@AreaA");

        let outcome = LevelSynchronizer::new(&api, SyncOptions::default())
            .synchronize_run("run-1", &plant_levels())
            .await;

        assert_eq!(
            outcome.levels[1],
            LevelReport {
                level: 1,
                submitted: 2,
                skipped: 0,
                created: 1,
                failed: 1,
            }
        );
        assert_eq!(
            outcome.levels[2],
            LevelReport {
                level: 2,
                submitted: 1,
                skipped: 2,
                created: 1,
                failed: 2,
            }
        );
    }
}
