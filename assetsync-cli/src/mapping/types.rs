//! Mapping configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How a single column participates in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnMapping {
    /// Column holds node names for hierarchy depth `level` (0 = root)
    Level {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<usize>,
    },
    /// Column holds the categorical tag (energy type) of the row's deepest node
    #[serde(alias = "EnergyType", alias = "energyType")]
    Categorical,
    /// Column is not used
    Ignore,
}

impl ColumnMapping {
    pub fn level(level: usize) -> Self {
        Self::Level { level: Some(level) }
    }

    /// Get display label for listings
    pub fn label(&self) -> String {
        match self {
            ColumnMapping::Level { level: Some(l) } => format!("level:{}", l),
            ColumnMapping::Level { level: None } => "level:?".to_string(),
            ColumnMapping::Categorical => "categorical".to_string(),
            ColumnMapping::Ignore => "ignore".to_string(),
        }
    }
}

/// Header (or `_col_<N>` key) → column mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    pub column_mappings: BTreeMap<String, ColumnMapping>,
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column assignment
    pub fn with(mut self, column: impl Into<String>, mapping: ColumnMapping) -> Self {
        self.column_mappings.insert(column.into(), mapping);
        self
    }

    /// Load a mapping from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mapping JSON: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_shape() {
        let config: MappingConfig = serde_json::from_value(json!({
            "columnMappings": {
                "Usine": {"type": "level", "level": 0},
                "Secteur": {"type": "level", "level": 1},
                "Type": {"type": "EnergyType"},
                "Notes": {"type": "ignore"}
            }
        }))
        .unwrap();

        assert_eq!(config.column_mappings["Usine"], ColumnMapping::level(0));
        assert_eq!(config.column_mappings["Type"], ColumnMapping::Categorical);
        assert_eq!(config.column_mappings["Notes"], ColumnMapping::Ignore);
    }

    #[test]
    fn test_level_without_number_still_parses() {
        let mapping: ColumnMapping = serde_json::from_value(json!({"type": "level"})).unwrap();
        assert_eq!(mapping, ColumnMapping::Level { level: None });
        assert_eq!(mapping.label(), "level:?");
    }

    #[test]
    fn test_serialize_categorical() {
        let value = serde_json::to_value(ColumnMapping::Categorical).unwrap();
        assert_eq!(value, json!({"type": "categorical"}));
    }
}
