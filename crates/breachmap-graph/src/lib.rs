//! Breachmap Graph: Neo4j client and path-query gateway.
//!
//! All reads against the network property graph flow through this crate so
//! that partition scoping is applied consistently: every traversed edge must
//! carry the active partition tag, and identifiers from the Device topology
//! layer are translated to Physical node ids before any path query runs.

pub mod client;
pub mod gateway;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use gateway::{TopologyEdge, TopologyResult};
