//! breachmap-core: Shared types and error handling for the Breachmap attack-path engine.
//!
//! This crate provides the foundational vocabulary used across all Breachmap
//! components:
//! - Node identity and per-node info as returned by path queries
//! - Raw path records (direct and pivot)
//! - Role classification for attack-path rendering
//! - Partition tags scoping which network layer a query may traverse
//! - Subnet grouping used for pivot candidate selection

pub mod error;
pub mod types;

pub use error::BreachmapError;
pub use types::{NodeIdentity, NodeInfo, Partition, PathKind, RawPath, Role};
