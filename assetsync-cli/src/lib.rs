//! assetsync: derive an asset hierarchy from tabular rows, create it on a
//! remote asset service parent-first, propagate leaf energy types into
//! ancestor flags, and create data variables for tagged leaves.

pub mod api;
pub mod cli;
pub mod config;
pub mod energy;
pub mod hierarchy;
pub mod mapping;
pub mod pipeline;
pub mod sync;
pub mod table;
