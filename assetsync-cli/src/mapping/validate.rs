//! Mapping validation
//!
//! Runs before any hierarchy is built and before any network activity. All
//! violations are collected so the operator can fix the mapping in one pass.

use std::collections::BTreeMap;

use super::{ColumnMapping, MappingConfig};

/// A mapping that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMapping {
    /// Hierarchy depth → column key, ascending by depth
    pub level_columns: BTreeMap<usize, String>,
    /// Column key of the categorical (energy type) column
    pub categorical_column: String,
}

impl ValidatedMapping {
    /// Deepest mapped level, `None` when no level column exists
    pub fn max_level(&self) -> Option<usize> {
        self.level_columns.keys().next_back().copied()
    }
}

/// Non-empty list of human-readable mapping violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingErrors(pub Vec<String>);

impl MappingErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for MappingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid column mapping: {}", self.0.join("; "))
    }
}

impl std::error::Error for MappingErrors {}

/// Validator for column mapping configurations
pub struct MappingValidator;

impl MappingValidator {
    /// Validate a mapping configuration.
    ///
    /// Rules:
    /// - a `level` column must carry a level number
    /// - each level number is assigned to at most one column
    /// - levels start at 0 and leave no gaps
    /// - exactly one column is `categorical`
    pub fn validate(config: &MappingConfig) -> Result<ValidatedMapping, MappingErrors> {
        let mut errors = Vec::new();
        let mut columns_by_level: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        let mut categorical_columns: Vec<&str> = Vec::new();

        for (column, mapping) in &config.column_mappings {
            match mapping {
                ColumnMapping::Level { level: Some(level) } => {
                    columns_by_level.entry(*level).or_default().push(column);
                }
                ColumnMapping::Level { level: None } => {
                    errors.push(format!(
                        "Column '{}' is type 'level' but level number is missing.",
                        column
                    ));
                }
                ColumnMapping::Categorical => categorical_columns.push(column),
                ColumnMapping::Ignore => {}
            }
        }

        for (level, columns) in &columns_by_level {
            if columns.len() > 1 {
                errors.push(format!(
                    "Level '{}' can only be assigned to one column. Found on: {}",
                    level,
                    columns.join(", ")
                ));
            }
        }

        match columns_by_level.keys().next_back() {
            None => errors.push("One column must be mapped as 'level' 0.".to_string()),
            Some(&deepest) => {
                let missing: Vec<String> = (0..deepest)
                    .filter(|level| !columns_by_level.contains_key(level))
                    .map(|level| level.to_string())
                    .collect();
                if !missing.is_empty() {
                    errors.push(format!(
                        "Levels must be contiguous from 0. No column for level(s): {}",
                        missing.join(", ")
                    ));
                }
            }
        }

        match categorical_columns.len() {
            0 => errors.push("One column must be mapped as 'categorical'.".to_string()),
            1 => {}
            _ => errors.push(format!(
                "'categorical' can only be assigned to one column. Found on: {}",
                categorical_columns.join(", ")
            )),
        }

        if !errors.is_empty() {
            return Err(MappingErrors(errors));
        }

        let level_columns = columns_by_level
            .into_iter()
            .filter_map(|(level, columns)| columns.first().map(|c| (level, c.to_string())))
            .collect();

        Ok(ValidatedMapping {
            level_columns,
            categorical_column: categorical_columns[0].to_string(),
        })
    }
}
