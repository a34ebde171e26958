//! Utilities for loading aggregate descriptions and replaying switch events.

pub use slicekeep_utils::*;
