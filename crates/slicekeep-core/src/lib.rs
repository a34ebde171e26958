#![warn(unreachable_pub, missing_debug_implementations)]

//! The core slicekeep library. This crate tracks the bookkeeping state of a network slice: which
//! of its switches are connected and flushed, and which group-table identifiers are free on each
//! leaf switch. An [`Aggregate`] is built once through an [`AggregateBuilder`] and is then shared
//! between switch-event handlers and flow installation.

#[macro_use]
mod ident;

pub mod aggregate;
pub mod builder;
pub mod opts;
pub mod pool;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::Aggregate;
pub use builder::{AggregateBuilder, BuildError};
pub use opts::AggregateOpts;
pub use pool::{GroupPool, MAX_GROUPS};
pub use registry::{RegistryError, SliceRegistry};
pub use types::{DatapathId, Gateway, GroupId, Node, Server, SwitchState};
