//! Rendering adapter: maps leveled graphs onto the display sink's contract.
//!
//! The sink accepts a flat node/edge list plus a layout hint: hierarchical
//! (attack-path mode, start at the top and target at the bottom) or
//! physics-driven (base topology mode). Roles carry the highlight classes;
//! the sink styles Start, Target and Via nodes distinctly and falls back to
//! a default treatment for everything else.

use serde::{Deserialize, Serialize};

use breachmap_core::types::{NodeIdentity, Role};
use breachmap_graph::TopologyResult;

use crate::level::LeveledGraph;

/// Presentation parameters for the hierarchical layout. Not part of the
/// algorithmic contract; values match the display sink's tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchyHint {
    /// Start renders at the top, target at the bottom.
    pub direction: String,
    pub level_separation: u32,
    pub node_spacing: u32,
}

impl Default for HierarchyHint {
    fn default() -> Self {
        Self {
            direction: "DU".to_string(),
            level_separation: 150,
            node_spacing: 100,
        }
    }
}

/// A layout-ready node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeIdentity,
    pub label: String,
    /// Hierarchical depth; absent in physics-driven layouts.
    pub level: Option<u32>,
    pub role: Role,
    /// Device category hint the sink maps to an icon.
    pub type_hint: Option<String>,
    pub properties: serde_json::Value,
}

/// A layout-ready edge, id keyed by the unordered endpoint pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub id: String,
    pub from: NodeIdentity,
    pub to: NodeIdentity,
}

/// The structure handed to the display sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    /// Present when the sink should lay nodes out by level; absent means
    /// physics-driven layout.
    pub hierarchy: Option<HierarchyHint>,
    /// Nodes with a non-default visual treatment (Start, Target, Via).
    pub highlight_set: Vec<NodeIdentity>,
}

/// Layout for a computed attack graph: hierarchical, levels attached.
pub fn layout_attack_graph(graph: &LeveledGraph) -> LayoutGraph {
    let nodes: Vec<LayoutNode> = graph
        .nodes
        .values()
        .map(|n| LayoutNode {
            id: n.record.info.identity,
            label: n.record.info.label(),
            level: Some(n.level),
            role: n.record.role,
            type_hint: n.record.info.node_type.clone(),
            properties: n.record.info.properties.clone(),
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|e| LayoutEdge {
            id: e.key(),
            from: e.from,
            to: e.to,
        })
        .collect();

    let highlight_set = nodes
        .iter()
        .filter(|n| n.role != Role::Plain)
        .map(|n| n.id)
        .collect();

    LayoutGraph {
        nodes,
        edges,
        hierarchy: Some(HierarchyHint::default()),
        highlight_set,
    }
}

/// Fallback layout when a start is selected but no path reaches the target:
/// a single start node, no edges, so the sink shows "selected but
/// unreachable" rather than an empty canvas.
pub fn layout_fallback(start: NodeIdentity) -> LayoutGraph {
    let node = LayoutNode {
        id: start,
        label: start.to_string(),
        level: None,
        role: Role::Start,
        type_hint: None,
        properties: serde_json::Value::Object(serde_json::Map::new()),
    };
    LayoutGraph {
        highlight_set: vec![node.id],
        nodes: vec![node],
        edges: Vec::new(),
        hierarchy: None,
    }
}

/// Base topology layout when no start is selected: every node and edge of
/// the partition, unleveled, physics-driven.
pub fn layout_topology(topology: &TopologyResult) -> LayoutGraph {
    let nodes = topology
        .nodes
        .iter()
        .map(|n| LayoutNode {
            id: n.identity,
            label: n.label(),
            level: None,
            role: Role::Plain,
            type_hint: n.node_type.clone(),
            properties: n.properties.clone(),
        })
        .collect();

    let edges = topology
        .edges
        .iter()
        .map(|e| LayoutEdge {
            id: format!("{}-{}", e.from.min(e.to), e.from.max(e.to)),
            from: e.from,
            to: e.to,
        })
        .collect();

    LayoutGraph {
        nodes,
        edges,
        hierarchy: None,
        highlight_set: Vec::new(),
    }
}
