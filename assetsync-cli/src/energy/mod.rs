//! Energy type propagation
//!
//! Leaves carry a categorical energy type; every ancestor gets boolean
//! presence flags for the types found below it, and every tagged leaf can get
//! data variables derived from its type.

mod propagate;
mod remote;
mod types;
mod variables;

pub use propagate::{HierarchyLink, build_parent_map, identify_leaf_assets, propagate_energy_types};
pub use remote::{
    RemoteFailure, RemoteReport, apply_flags, leaf_energy_from_attributes, leaf_energy_from_paths,
    tag_leaves,
};
pub use types::{EnergyFlags, EnergyMap, EnergyType, ParentMap};
pub use variables::{
    DEFAULT_VARIABLE_CHUNK_SIZE, VariableChunkFailure, VariableReport, VariableTemplate,
    VariableTemplates, build_variables, create_variables, format_topic_path, format_variable_name,
};
