//! `slicekeep` keeps the control-plane bookkeeping of software-defined network slices. Each slice
//! (an *aggregate*) is a named set of gateways, root and leaf switches, and servers. The library
//! tracks which of those switches are connected and freshly flushed, and hands out group-table
//! identifiers on leaf switches without collision.

#![warn(unreachable_pub, missing_docs)]

pub mod core;
pub mod utils;
