//! Progress reporting for synchronization runs

use log::{debug, info};

use super::types::LevelReport;

/// Receives progress events while levels are synchronized
pub trait SyncProgressReporter: Send + Sync {
    /// A level is about to be processed
    fn level_started(&self, level: usize, nodes: usize, chunks: usize);

    /// One chunk of a level finished (successfully or not)
    fn chunk_finished(&self, level: usize, chunk: usize, created: usize, failed: usize);

    /// Every chunk of the level was merged
    fn level_finished(&self, report: &LevelReport);
}

/// Reporter that discards events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressReporter;

impl SyncProgressReporter for NoopProgressReporter {
    fn level_started(&self, _level: usize, _nodes: usize, _chunks: usize) {}
    fn chunk_finished(&self, _level: usize, _chunk: usize, _created: usize, _failed: usize) {}
    fn level_finished(&self, _report: &LevelReport) {}
}

/// Reporter that writes events to the log, tagged with the run id
#[derive(Debug, Clone)]
pub struct LogProgressReporter {
    run_id: String,
}

impl LogProgressReporter {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

impl SyncProgressReporter for LogProgressReporter {
    fn level_started(&self, level: usize, nodes: usize, chunks: usize) {
        info!(
            "[{}] Level {}: {} nodes in {} chunk(s)",
            self.run_id, level, nodes, chunks
        );
    }

    fn chunk_finished(&self, level: usize, chunk: usize, created: usize, failed: usize) {
        debug!(
            "[{}] Level {} chunk {}: {} created, {} failed",
            self.run_id, level, chunk, created, failed
        );
    }

    fn level_finished(&self, report: &LevelReport) {
        info!(
            "[{}] Level {} done: {} created, {} failed, {} skipped",
            self.run_id, report.level, report.created, report.failed, report.skipped
        );
    }
}
