//! Hierarchy node types

use serde::{Deserialize, Serialize};

/// Separator between segments of a path key
pub const PATH_SEPARATOR: &str = "@";

/// A node to be created, identified by its full path key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNode {
    /// Last segment of the path
    pub name: String,
    /// Path key of the parent, `None` for roots
    pub parent_path: Option<String>,
    /// Ancestor names and own name joined by `@`; unique within a run
    pub full_path: String,
    /// Identifier sent to the service; defaults to `full_path`
    pub external_id: String,
}

impl AssetNode {
    /// Create a node from its path segments (must be non-empty)
    pub fn from_segments(segments: &[&str]) -> Self {
        let full_path = segments.join(PATH_SEPARATOR);
        let (name, parent_path) = match segments.split_last() {
            Some((last, [])) => (last.to_string(), None),
            Some((last, ancestors)) => (last.to_string(), Some(ancestors.join(PATH_SEPARATOR))),
            None => (String::new(), None),
        };

        Self {
            name,
            parent_path,
            external_id: full_path.clone(),
            full_path,
        }
    }

    /// Depth of the node, derived from its path key
    pub fn level(&self) -> usize {
        self.full_path.matches(PATH_SEPARATOR).count()
    }

    pub fn is_root(&self) -> bool {
        self.parent_path.is_none()
    }
}

/// All nodes at one depth, in first-seen row order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLevel {
    pub level: usize,
    pub nodes: Vec<AssetNode>,
}

impl AssetLevel {
    pub fn new(level: usize) -> Self {
        Self {
            level,
            nodes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Total node count across levels
pub fn total_nodes(levels: &[AssetLevel]) -> usize {
    levels.iter().map(AssetLevel::len).sum()
}
