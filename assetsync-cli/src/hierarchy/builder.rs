//! Build leveled, deduplicated hierarchy nodes from rows

use std::collections::{BTreeMap, HashSet};

use anyhow::{Result, bail};
use log::{debug, warn};

use crate::mapping::ValidatedMapping;
use crate::table::Table;

use super::node::{AssetLevel, AssetNode, PATH_SEPARATOR};

/// Default cap on hierarchy depth
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Turns rows into path-keyed nodes grouped by depth.
///
/// A row contributes the contiguous run of populated level cells starting at
/// level 0. The first blank (or unmapped) level ends the row's path, so a row
/// whose level-0 cell is blank contributes nothing.
#[derive(Debug, Clone)]
pub struct HierarchyBuilder {
    /// Column index per level; `None` marks a level with no column
    level_columns: Vec<Option<usize>>,
    categorical_column: usize,
}

impl HierarchyBuilder {
    /// Resolve the validated mapping against the table headers
    pub fn new(mapping: &ValidatedMapping, table: &Table) -> Result<Self> {
        let mut unresolved = Vec::new();

        let depth = mapping.max_level().map(|l| l + 1).unwrap_or(0);
        let mut level_columns = vec![None; depth];
        for (level, key) in &mapping.level_columns {
            match table.column_index(key) {
                Some(idx) => level_columns[*level] = Some(idx),
                None => unresolved.push(key.clone()),
            }
        }

        let categorical_column = table.column_index(&mapping.categorical_column);
        if categorical_column.is_none() {
            unresolved.push(mapping.categorical_column.clone());
        }

        if !unresolved.is_empty() {
            bail!(
                "Mapped columns not found in table headers: {}",
                unresolved.join(", ")
            );
        }

        Ok(Self {
            level_columns,
            categorical_column: categorical_column.unwrap_or_default(),
        })
    }

    /// Reject a mapping with more levels than `max_depth`.
    ///
    /// Mapped levels are never truncated; a mapping deeper than the cap is a
    /// configuration error raised before any row is read.
    pub fn with_max_depth(self, max_depth: usize) -> Result<Self> {
        if self.level_columns.len() > max_depth {
            bail!(
                "Mapping has {} levels but sync.max_depth is {}; raise max_depth or map fewer levels",
                self.level_columns.len(),
                max_depth
            );
        }
        Ok(self)
    }

    /// Column index mapped to `level`, if any
    pub fn level_column(&self, level: usize) -> Option<usize> {
        self.level_columns.get(level).copied().flatten()
    }

    /// Number of levels that will be read per row
    pub fn depth(&self) -> usize {
        self.level_columns.len()
    }

    pub fn categorical_column(&self) -> usize {
        self.categorical_column
    }

    /// Path segments contributed by one row
    pub fn row_path<'a>(&self, row: &'a [String]) -> Vec<&'a str> {
        let mut segments = Vec::new();

        for level in 0..self.depth() {
            let Some(column) = self.level_column(level) else {
                break;
            };
            let Some(value) = Table::cell(row, column) else {
                break;
            };
            if value.contains(PATH_SEPARATOR) {
                warn!(
                    "Name '{}' at level {} contains '{}'; row path stops before it",
                    value, level, PATH_SEPARATOR
                );
                break;
            }
            segments.push(value);
        }

        segments
    }

    /// Build levels (level 0 first). Every prefix of every row path becomes a
    /// node exactly once; repeated paths are silently deduplicated.
    pub fn build(&self, rows: &[Vec<String>]) -> Vec<AssetLevel> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut levels: Vec<AssetLevel> = Vec::new();
        let mut empty_rows = 0usize;

        for row in rows {
            let path = self.row_path(row);
            if path.is_empty() {
                empty_rows += 1;
                continue;
            }

            for depth in 0..path.len() {
                let node = AssetNode::from_segments(&path[..=depth]);
                if !seen.insert(node.full_path.clone()) {
                    continue;
                }
                if levels.len() <= depth {
                    levels.push(AssetLevel::new(depth));
                }
                levels[depth].nodes.push(node);
            }
        }

        debug!(
            "Built {} levels with {} nodes from {} rows ({} rows without a level-0 value)",
            levels.len(),
            seen.len(),
            rows.len(),
            empty_rows
        );

        levels
    }

    /// Categorical value per deepest row path. The first non-empty value seen
    /// for a path wins.
    pub fn path_categories(&self, rows: &[Vec<String>]) -> BTreeMap<String, String> {
        let mut categories = BTreeMap::new();

        for row in rows {
            let path = self.row_path(row);
            if path.is_empty() {
                continue;
            }
            let Some(value) = Table::cell(row, self.categorical_column) else {
                continue;
            };
            categories
                .entry(path.join(PATH_SEPARATOR))
                .or_insert_with(|| value.to_string());
        }

        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::total_nodes;
    use crate::mapping::{ColumnMapping, MappingConfig, MappingValidator};

    fn headers() -> Vec<String> {
        ["Usine", "Secteur", "Machine", "Type"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn rows(data: &[[&str; 4]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn builder_for(table: &Table) -> HierarchyBuilder {
        let mapping = MappingConfig::new()
            .with("Usine", ColumnMapping::level(0))
            .with("Secteur", ColumnMapping::level(1))
            .with("Machine", ColumnMapping::level(2))
            .with("Type", ColumnMapping::Categorical);
        let validated = MappingValidator::validate(&mapping).unwrap();
        HierarchyBuilder::new(&validated, table).unwrap()
    }

    fn paths(level: &AssetLevel) -> Vec<&str> {
        level.nodes.iter().map(|n| n.full_path.as_str()).collect()
    }

    #[test]
    fn test_build_plant_scenario() {
        let table = Table::new(
            headers(),
            rows(&[
                ["Plant1", "AreaA", "Pump1", "electricity"],
                ["Plant1", "AreaA", "Pump2", "electricity"],
                ["Plant1", "AreaB", "Fan1", "gas"],
            ]),
        );

        let levels = builder_for(&table).build(&table.rows);

        assert_eq!(levels.len(), 3);
        assert_eq!(total_nodes(&levels), 6);
        assert_eq!(paths(&levels[0]), vec!["Plant1"]);
        assert_eq!(paths(&levels[1]), vec!["Plant1@AreaA", "Plant1@AreaB"]);
        assert_eq!(
            paths(&levels[2]),
            vec!["Plant1@AreaA@Pump1", "Plant1@AreaA@Pump2", "Plant1@AreaB@Fan1"]
        );
        assert_eq!(levels[2].nodes[2].parent_path.as_deref(), Some("Plant1@AreaB"));
        assert_eq!(levels[0].nodes[0].parent_path, None);
    }

    #[test]
    fn test_duplicate_rows_are_deduplicated() {
        let table = Table::new(
            headers(),
            rows(&[
                ["Plant1", "AreaA", "Pump1", ""],
                ["Plant1", "AreaA", "Pump1", ""],
                [" Plant1 ", "AreaA ", "Pump1", ""],
            ]),
        );

        let levels = builder_for(&table).build(&table.rows);

        assert_eq!(total_nodes(&levels), 3);
    }

    #[test]
    fn test_level_matches_separator_count() {
        let table = Table::new(
            headers(),
            rows(&[
                ["P1", "A", "M1", ""],
                ["P1", "B", "", ""],
                ["P2", "", "", ""],
                ["P2", "C", "M2", ""],
            ]),
        );

        for level in builder_for(&table).build(&table.rows) {
            for node in &level.nodes {
                assert_eq!(node.level(), level.level);
                assert_eq!(node.full_path.matches('@').count(), level.level);
            }
        }
    }

    #[test]
    fn test_blank_first_level_contributes_nothing() {
        let table = Table::new(headers(), rows(&[["", "AreaA", "Pump1", "gas"]]));

        let levels = builder_for(&table).build(&table.rows);

        assert!(levels.is_empty());
    }

    #[test]
    fn test_blank_intermediate_level_stops_row() {
        let table = Table::new(headers(), rows(&[["Plant1", "", "Pump1", "gas"]]));

        let levels = builder_for(&table).build(&table.rows);

        assert_eq!(levels.len(), 1);
        assert_eq!(paths(&levels[0]), vec!["Plant1"]);
    }

    #[test]
    fn test_no_case_normalization() {
        let table = Table::new(
            headers(),
            rows(&[["Plant1", "", "", ""], ["plant1", "", "", ""]]),
        );

        let levels = builder_for(&table).build(&table.rows);

        assert_eq!(paths(&levels[0]), vec!["Plant1", "plant1"]);
    }

    #[test]
    fn test_separator_in_name_stops_row() {
        let table = Table::new(headers(), rows(&[["Plant1", "Area@A", "Pump1", ""]]));

        let levels = builder_for(&table).build(&table.rows);

        assert_eq!(total_nodes(&levels), 1);
    }

    #[test]
    fn test_mapping_deeper_than_max_depth_is_rejected() {
        let table = Table::new(headers(), rows(&[["Plant1", "AreaA", "Pump1", ""]]));

        let err = builder_for(&table).with_max_depth(2).unwrap_err();

        assert!(err.to_string().contains("3 levels"));
        assert!(err.to_string().contains("max_depth is 2"));
    }

    #[test]
    fn test_max_depth_at_mapping_depth_reads_every_level() {
        let table = Table::new(headers(), rows(&[["Plant1", "AreaA", "Pump1", ""]]));

        let levels = builder_for(&table)
            .with_max_depth(3)
            .unwrap()
            .build(&table.rows);

        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn test_unknown_mapped_column_is_an_error() {
        let table = Table::new(vec!["Usine".into(), "Type".into()], vec![]);
        let mapping = MappingConfig::new()
            .with("Usine", ColumnMapping::level(0))
            .with("Atelier", ColumnMapping::level(1))
            .with("Type", ColumnMapping::Categorical);
        let validated = MappingValidator::validate(&mapping).unwrap();

        let err = HierarchyBuilder::new(&validated, &table).unwrap_err();

        assert!(err.to_string().contains("Atelier"));
    }

    #[test]
    fn test_path_categories_first_value_wins() {
        let table = Table::new(
            headers(),
            rows(&[
                ["Plant1", "AreaA", "Pump1", "electricity"],
                ["Plant1", "AreaA", "Pump1", "gas"],
                ["Plant1", "AreaB", "", "water"],
                ["Plant1", "AreaC", "Fan1", ""],
            ]),
        );

        let categories = builder_for(&table).path_categories(&table.rows);

        assert_eq!(categories.len(), 2);
        assert_eq!(categories["Plant1@AreaA@Pump1"], "electricity");
        assert_eq!(categories["Plant1@AreaB"], "water");
    }
}
