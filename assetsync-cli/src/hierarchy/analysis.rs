//! Dry-run analysis of a table against a mapping
//!
//! Reports what the builder would silently skip or what the service is likely
//! to reject, without contacting the service.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::table::Table;

use super::builder::HierarchyBuilder;
use super::node::PATH_SEPARATOR;

/// Longest name or categorical value the service accepts
const MAX_VALUE_LENGTH: usize = 50;

static FORBIDDEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_\-\s\.\(\)]").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single finding, tied to a 1-based data row when applicable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub row: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        match self.row {
            Some(row) => write!(f, "{} (Row {}): {}", label, row, self.message),
            None => write!(f, "{}: {}", label, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub issues: Vec<Issue>,
}

impl AnalysisReport {
    fn warn(&mut self, row: usize, message: String) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            row: Some(row),
            message,
        });
    }

    fn error(&mut self, row: Option<usize>, message: String) {
        self.issues.push(Issue {
            severity: Severity::Error,
            row,
            message,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// One-line verdict
    pub fn summary(&self) -> &'static str {
        if self.has_errors() {
            "Completed with ERRORS. Fix the mapping or data before syncing."
        } else if self.issues.is_empty() {
            "No errors or warnings detected."
        } else {
            "Completed with warnings. Please review."
        }
    }
}

fn preview(value: &str) -> String {
    if value.chars().count() > 20 {
        format!("{}...", value.chars().take(20).collect::<String>())
    } else {
        value.to_string()
    }
}

fn check_value(report: &mut AnalysisReport, row: usize, what: &str, value: &str) {
    if value.chars().count() > MAX_VALUE_LENGTH {
        report.warn(
            row,
            format!(
                "{} \"{}\" exceeds {} chars.",
                what,
                preview(value),
                MAX_VALUE_LENGTH
            ),
        );
    }
    let forbidden: Vec<&str> = FORBIDDEN_CHARS
        .find_iter(value)
        .map(|m| m.as_str())
        .collect();
    if !forbidden.is_empty() {
        report.warn(
            row,
            format!(
                "{} \"{}\" contains forbidden chars: {}.",
                what,
                preview(value),
                forbidden.join(", ")
            ),
        );
    }
}

/// Analyze every row the way the builder would read it
pub fn analyze(table: &Table, builder: &HierarchyBuilder) -> AnalysisReport {
    let mut report = AnalysisReport::default();

    if table.rows.is_empty() {
        report.error(None, "No data rows to process.".to_string());
        return report;
    }

    // path → (first row, categorical value)
    let mut categories: HashMap<String, (usize, String)> = HashMap::new();

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = idx + 1;
        let path = builder.row_path(row);

        if path.is_empty() {
            let first = builder
                .level_column(0)
                .and_then(|col| Table::cell(row, col));
            match first {
                Some(value) if value.contains(PATH_SEPARATOR) => report.error(
                    Some(row_num),
                    format!("Name \"{}\" contains the path separator '{}'.", preview(value), PATH_SEPARATOR),
                ),
                _ => report.warn(
                    row_num,
                    "Skipping row. Cannot determine a name from the level-0 column.".to_string(),
                ),
            }
            continue;
        }

        for (level, name) in path.iter().enumerate() {
            check_value(&mut report, row_num, &format!("Name (Level {})", level), name);
        }

        // Whatever ended the path: a separator, or a blank followed by more values
        let stop = path.len();
        if let Some(value) = builder.level_column(stop).and_then(|col| Table::cell(row, col)) {
            if value.contains(PATH_SEPARATOR) {
                report.error(
                    Some(row_num),
                    format!(
                        "Name \"{}\" contains the path separator '{}'.",
                        preview(value),
                        PATH_SEPARATOR
                    ),
                );
            }
        } else {
            let deeper = (stop + 1..builder.depth())
                .filter_map(|level| builder.level_column(level))
                .any(|col| Table::cell(row, col).is_some());
            if deeper {
                report.warn(
                    row_num,
                    format!(
                        "Level {} is blank; values in deeper level columns are ignored.",
                        stop
                    ),
                );
            }
        }

        if let Some(value) = Table::cell(row, builder.categorical_column()) {
            check_value(&mut report, row_num, "Category", value);

            let key = path.join(PATH_SEPARATOR);
            match categories.get(&key) {
                Some((first_row, existing)) if existing != value => report.warn(
                    row_num,
                    format!(
                        "\"{}\" already has category \"{}\" from row {}; \"{}\" is ignored.",
                        key, existing, first_row, value
                    ),
                ),
                Some(_) => {}
                None => {
                    categories.insert(key, (row_num, value.to_string()));
                }
            }
        }
    }

    report
}
