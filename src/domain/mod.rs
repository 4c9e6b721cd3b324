//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Domain types, method names and reply shaping
//! - `client.rs`: Sub-clients issuing signed calls through `NodeRpcClient`

pub mod node;
