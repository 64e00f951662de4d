//! Header-based mapping suggestion

use crate::table::Table;

use super::{ColumnMapping, MappingConfig};

/// Header fragments recognised as hierarchy levels, in level order
const LEVEL_HINTS: &[(&str, usize)] = &[
    ("usine", 0),
    ("site", 0),
    ("secteur", 1),
    ("zone", 1),
    ("atelier", 2),
    ("machine", 3),
    ("equipement", 3),
    ("équipement", 3),
];

/// Header fragments recognised as the categorical (energy type) column
const CATEGORICAL_HINTS: &[&str] = &["energytype", "energie", "énergie", "energy"];

fn guess_column(header: &str) -> ColumnMapping {
    let h = header.trim().to_lowercase();

    if h == "type" || CATEGORICAL_HINTS.iter().any(|hint| h.contains(hint)) {
        return ColumnMapping::Categorical;
    }

    LEVEL_HINTS
        .iter()
        .find(|(hint, _)| h.contains(hint))
        .map(|(_, level)| ColumnMapping::level(*level))
        .unwrap_or(ColumnMapping::Ignore)
}

/// Propose a mapping from the table's header names.
///
/// Only the first categorical-looking column and the first column per level are
/// kept; later matches fall back to `ignore`. The result is a suggestion and
/// still goes through [`super::MappingValidator`].
pub fn suggest_mapping(table: &Table) -> MappingConfig {
    let mut config = MappingConfig::new();
    let mut categorical_taken = false;
    let mut levels_taken = Vec::new();

    for column in 0..table.headers.len() {
        let key = table.column_key(column);
        let guess = match guess_column(&table.headers[column]) {
            ColumnMapping::Categorical if categorical_taken => ColumnMapping::Ignore,
            ColumnMapping::Categorical => {
                categorical_taken = true;
                ColumnMapping::Categorical
            }
            ColumnMapping::Level { level: Some(level) } if levels_taken.contains(&level) => {
                ColumnMapping::Ignore
            }
            ColumnMapping::Level { level: Some(level) } => {
                levels_taken.push(level);
                ColumnMapping::level(level)
            }
            other => other,
        };
        config.column_mappings.insert(key, guess);
    }

    config
}
