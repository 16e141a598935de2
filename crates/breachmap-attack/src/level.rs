//! Level assignment: deterministic topological depth for hierarchical layout.
//!
//! Every non-target node's depth is the dense rank (1-based) of the rounded
//! mean of its positions across all merged paths; the target is forced one
//! level past the deepest non-target node so it always renders at the bottom
//! of the hierarchy.
//!
//! Rounding is half-away-from-zero (`f64::round`). Positions are always
//! non-negative, so this bucketing is stable and documented here once.

use std::collections::BTreeMap;

use breachmap_core::types::NodeIdentity;

use crate::merge::{EdgeRecord, MergedGraph, NodeRecord};

/// A merged node annotated with its layer.
#[derive(Debug, Clone)]
pub struct LeveledNode {
    pub record: NodeRecord,
    /// 1-based depth; the target's level exceeds every other node's.
    pub level: u32,
}

/// The merged graph with levels assigned.
#[derive(Debug, Clone, Default)]
pub struct LeveledGraph {
    pub nodes: BTreeMap<NodeIdentity, LeveledNode>,
    pub edges: Vec<EdgeRecord>,
    pub start: Option<NodeIdentity>,
    pub target: Option<NodeIdentity>,
    pub max_level: u32,
}

/// Assign levels to a merged graph.
pub fn assign_levels(mut merged: MergedGraph) -> LeveledGraph {
    let target = merged.target;
    let target_record = target.and_then(|t| merged.nodes.remove(&t));

    // Rounded average position per non-target node.
    let rounded: BTreeMap<NodeIdentity, Option<i64>> = merged
        .nodes
        .iter()
        .map(|(&identity, record)| (identity, rounded_average(record)))
        .collect();

    // Dense rank: distinct rounded values, ascending, mapped to 1, 2, 3, ...
    let mut distinct: Vec<i64> = rounded.values().filter_map(|v| *v).collect();
    distinct.sort_unstable();
    distinct.dedup();
    let rank: BTreeMap<i64, u32> = distinct
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v, i as u32 + 1))
        .collect();

    let mut leveled = LeveledGraph {
        edges: merged.edges,
        start: merged.start,
        target,
        ..Default::default()
    };

    let mut max_level = 0u32;
    for (identity, record) in merged.nodes {
        // Nodes without positions should not occur given the merger
        // contract; they default to the shallowest layer.
        let level = rounded
            .get(&identity)
            .and_then(|v| *v)
            .and_then(|v| rank.get(&v).copied())
            .unwrap_or(1);
        max_level = max_level.max(level);
        leveled.nodes.insert(identity, LeveledNode { record, level });
    }

    // The target is always strictly deepest.
    if let (Some(target_id), Some(record)) = (target, target_record) {
        let level = max_level + 1;
        max_level = level;
        leveled.nodes.insert(target_id, LeveledNode { record, level });
    }

    leveled.max_level = max_level;
    leveled
}

fn rounded_average(record: &NodeRecord) -> Option<i64> {
    if record.positions.is_empty() {
        return None;
    }
    let sum: usize = record.positions.iter().sum();
    let avg = sum as f64 / record.positions.len() as f64;
    Some(avg.round() as i64)
}
