//! Hierarchy derivation from flat rows
//!
//! Rows are turned into path-keyed nodes (`Plant1@AreaA@Pump1`), deduplicated
//! by full path and grouped by depth so they can be created parent-first.

mod analysis;
mod builder;
mod node;

pub use analysis::{AnalysisReport, Issue, Severity, analyze};
pub use builder::{DEFAULT_MAX_DEPTH, HierarchyBuilder};
pub use node::{AssetLevel, AssetNode, PATH_SEPARATOR, total_nodes};
