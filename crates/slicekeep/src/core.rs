//! Core slicekeep data structures: aggregates, their builder, group pools, and the slice
//! registry.

pub use slicekeep_core::*;
