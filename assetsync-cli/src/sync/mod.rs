//! Level-ordered synchronization of a hierarchy against the asset service

mod progress;
mod reconcile;
mod synchronizer;
mod types;

pub use progress::{LogProgressReporter, NoopProgressReporter, SyncProgressReporter};
pub use reconcile::{ChunkOutcome, classify_chunk_error, fail_chunk, reconcile_chunk};
pub use synchronizer::{DEFAULT_CHUNK_SIZE, LevelSynchronizer, SyncOptions};
pub use types::{BulkAssetError, CreatedAsset, ErrorKey, LevelReport, SyncOutcome};
