//! Column mapping configuration
//!
//! Tags each table column as a hierarchy level, the categorical (energy type)
//! column, or ignored, and validates the assignment before any hierarchy is built.

mod suggest;
mod types;
mod validate;

pub use suggest::suggest_mapping;
pub use types::{ColumnMapping, MappingConfig};
pub use validate::{MappingErrors, MappingValidator, ValidatedMapping};
