//! Core domain types for attack-path construction.
//!
//! These types describe the property graph as seen through one query session:
//! physical nodes, the partition tag scoping edge visibility, and the raw
//! path records returned by the graph query gateway.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

// ── Partition ─────────────────────────────────────────────────────

/// A project/layer tag on nodes and edges. Queries only traverse edges
/// carrying the active partition, so paths never leak across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Partition(pub String);

impl Partition {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self("multi-layer".to_string())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Node Identity ─────────────────────────────────────────────────

/// The graph database's internal node id. Stable within one query session;
/// never persisted across sessions.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct NodeIdentity(pub i64);

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Node Info ─────────────────────────────────────────────────────

/// Per-node info captured once at query ingestion.
///
/// The algorithm only ever interprets `node_type` (infrastructure check) and
/// `ip` (subnet grouping); everything else is carried through for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub identity: NodeIdentity,
    /// Device category: "switch", "router", "workstation", "server", ...
    pub node_type: Option<String>,
    /// Dotted-quad address, when the device has one.
    pub ip: Option<String>,
    /// Human-readable display name.
    pub name: Option<String>,
    /// Number of partition-scoped connections this node has.
    pub degree: u32,
    /// Free-form property bag, never interpreted by the pipeline.
    pub properties: serde_json::Value,
}

impl NodeInfo {
    /// Display label, falling back to the identity when no name is set.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.identity.to_string(),
        }
    }

    /// Switches and routers are infrastructure: they legitimately recur
    /// across branching paths, so the single-occurrence rule exempts them.
    /// The check is case-insensitive and substring-based.
    pub fn is_infrastructure(&self) -> bool {
        match &self.node_type {
            Some(t) => {
                let t = t.to_lowercase();
                t.contains("switch") || t.contains("router")
            }
            None => false,
        }
    }

    /// The /16 subnet this node's ip belongs to, if it parses.
    pub fn subnet(&self) -> Option<Ipv4Net> {
        self.ip.as_deref().and_then(subnet16)
    }
}

/// Truncate a dotted-quad address to its first two octets, expressed as the
/// containing /16 network. Pivot candidates must sit on a different /16 than
/// the start node.
pub fn subnet16(ip: &str) -> Option<Ipv4Net> {
    let addr = Ipv4Addr::from_str(ip.trim()).ok()?;
    let net = Ipv4Net::new(addr, 16).ok()?;
    Some(net.trunc())
}

// ── Roles ─────────────────────────────────────────────────────────

/// Classification of a node within one attack-path session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The attacker's entry point.
    Start,
    /// The attack target; always rendered at the deepest level.
    Target,
    /// An intermediate endpoint device (not infrastructure) on a path.
    Via,
    /// Everything else, i.e. infrastructure along the way.
    Plain,
}

// ── Raw Paths ─────────────────────────────────────────────────────

/// How a raw path was discovered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    /// A simple path between start and target, 1..10 hops.
    Direct,
    /// Two shortest paths joined at a sampled pivot node on another subnet.
    Pivot,
}

/// An ordered node sequence returned by one path query. The first entry is
/// the start, the last is the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPath {
    pub kind: PathKind,
    pub nodes: Vec<NodeInfo>,
}

impl RawPath {
    pub fn new(kind: PathKind, nodes: Vec<NodeInfo>) -> Self {
        Self { kind, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
