//! Number formatting for chain-specific quantities.

pub mod hex;
