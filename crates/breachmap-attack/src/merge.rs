//! Path merging: union of cleaned paths into one deduplicated graph.
//!
//! Nodes are keyed by identity and accumulate their position-in-path across
//! every path they appear in; those positions later drive level assignment.
//! Edges are deduplicated by unordered endpoint pair, with direction fixed
//! by the first path that introduces the pair.
//!
//! Because pivot sampling randomizes query order, the input is first sorted
//! by a stable key (path length, then identity sequence) so that first-seen
//! outcomes are deterministic on identical underlying data.

use std::collections::{BTreeMap, HashSet};

use breachmap_core::types::{NodeIdentity, NodeInfo, Role};

use crate::dedup::CleanedPath;

/// One merged node with its accumulated path positions.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub info: NodeInfo,
    pub role: Role,
    /// One entry per occurrence in any cleaned path, in merge order.
    pub positions: Vec<usize>,
}

/// A deduplicated connection, direction as first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub from: NodeIdentity,
    pub to: NodeIdentity,
}

impl EdgeRecord {
    /// Unordered pair key, `min-max`, matching the display sink's edge ids.
    pub fn key(&self) -> String {
        let a = self.from.min(self.to);
        let b = self.from.max(self.to);
        format!("{a}-{b}")
    }
}

/// The union structure built from all cleaned paths of one query session.
#[derive(Debug, Clone, Default)]
pub struct MergedGraph {
    /// Keyed by identity; iteration order is identity order (deterministic).
    pub nodes: BTreeMap<NodeIdentity, NodeRecord>,
    /// Insertion-ordered, one record per unordered endpoint pair.
    pub edges: Vec<EdgeRecord>,
    pub start: Option<NodeIdentity>,
    pub target: Option<NodeIdentity>,
}

impl MergedGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Merge cleaned paths into a single graph.
///
/// Role classification per node: Start and Target by identity, otherwise
/// Via for endpoint devices and Plain for infrastructure. The first path to
/// introduce a node fixes its role; later paths never downgrade it.
pub fn merge_paths(
    mut paths: Vec<CleanedPath>,
    start: NodeIdentity,
    target: NodeIdentity,
) -> MergedGraph {
    // Stable merge order regardless of query/sampling order.
    paths.sort_by(|a, b| {
        a.nodes
            .len()
            .cmp(&b.nodes.len())
            .then_with(|| a.identity_sequence().cmp(&b.identity_sequence()))
    });

    let mut merged = MergedGraph {
        start: Some(start),
        target: Some(target),
        ..Default::default()
    };
    let mut edge_pairs: HashSet<(NodeIdentity, NodeIdentity)> = HashSet::new();

    for path in &paths {
        for (i, node) in path.nodes.iter().enumerate() {
            merged
                .nodes
                .entry(node.identity)
                .or_insert_with(|| NodeRecord {
                    info: node.clone(),
                    role: classify(node, start, target),
                    positions: Vec::new(),
                })
                .positions
                .push(i);

            if i > 0 {
                let prev = path.nodes[i - 1].identity;
                let pair = (prev.min(node.identity), prev.max(node.identity));
                if edge_pairs.insert(pair) {
                    merged.edges.push(EdgeRecord {
                        from: prev,
                        to: node.identity,
                    });
                }
            }
        }
    }

    merged
}

fn classify(node: &NodeInfo, start: NodeIdentity, target: NodeIdentity) -> Role {
    if node.identity == start {
        Role::Start
    } else if node.identity == target {
        Role::Target
    } else if !node.is_infrastructure() {
        Role::Via
    } else {
        Role::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breachmap_core::types::{NodeInfo, PathKind, RawPath};

    use crate::dedup::clean_path;

    fn node(id: i64, node_type: &str) -> NodeInfo {
        NodeInfo {
            identity: NodeIdentity(id),
            node_type: Some(node_type.to_string()),
            ip: None,
            name: None,
            degree: 0,
            properties: serde_json::json!({}),
        }
    }

    fn cleaned(nodes: Vec<NodeInfo>) -> CleanedPath {
        clean_path(&RawPath::new(PathKind::Direct, nodes)).unwrap()
    }

    #[test]
    fn single_path_merge() {
        let path = cleaned(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
        ]);
        let merged = merge_paths(vec![path], NodeIdentity(1), NodeIdentity(3));

        assert_eq!(merged.nodes.len(), 3);
        assert_eq!(merged.edges.len(), 2);
        assert_eq!(merged.nodes[&NodeIdentity(1)].role, Role::Start);
        assert_eq!(merged.nodes[&NodeIdentity(2)].role, Role::Plain);
        assert_eq!(merged.nodes[&NodeIdentity(3)].role, Role::Target);
        assert_eq!(merged.nodes[&NodeIdentity(2)].positions, vec![1]);
    }

    #[test]
    fn shared_nodes_accumulate_positions() {
        let p1 = cleaned(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(4, "server"),
        ]);
        let p2 = cleaned(vec![
            node(1, "workstation"),
            node(3, "switch"),
            node(2, "switch"),
            node(4, "server"),
        ]);
        let merged = merge_paths(vec![p1, p2], NodeIdentity(1), NodeIdentity(4));

        // Node 2 sits at position 1 in the first path and 2 in the second.
        assert_eq!(merged.nodes[&NodeIdentity(2)].positions, vec![1, 2]);
        // Start appears once per path.
        assert_eq!(merged.nodes[&NodeIdentity(1)].positions, vec![0, 0]);
    }

    #[test]
    fn duplicate_edges_collapse_across_paths() {
        let p1 = cleaned(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
        ]);
        let p2 = cleaned(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
        ]);
        let merged = merge_paths(vec![p1, p2], NodeIdentity(1), NodeIdentity(3));
        assert_eq!(merged.edges.len(), 2);
    }

    #[test]
    fn edge_direction_is_first_seen_and_pair_unique() {
        // Second path traverses 2→1, the reverse of the first path's 1→2.
        let p1 = cleaned(vec![node(1, "workstation"), node(2, "switch"), node(3, "server")]);
        let p2 = cleaned(vec![node(2, "switch"), node(1, "workstation"), node(3, "server")]);
        let merged = merge_paths(vec![p1, p2], NodeIdentity(1), NodeIdentity(3));

        let pair_12: Vec<&EdgeRecord> = merged
            .edges
            .iter()
            .filter(|e| e.key() == "1-2")
            .collect();
        assert_eq!(pair_12.len(), 1);
    }

    #[test]
    fn via_role_for_non_infrastructure_intermediate() {
        let path = cleaned(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(5, "workstation"), // pivot-like endpoint in the middle
            node(6, "switch"),
            node(3, "server"),
        ]);
        let merged = merge_paths(vec![path], NodeIdentity(1), NodeIdentity(3));
        assert_eq!(merged.nodes[&NodeIdentity(5)].role, Role::Via);
        assert_eq!(merged.nodes[&NodeIdentity(6)].role, Role::Plain);
    }

    #[test]
    fn merge_order_is_stable_regardless_of_input_order() {
        let p1 = || cleaned(vec![node(1, "workstation"), node(2, "switch"), node(3, "server")]);
        let p2 = || {
            cleaned(vec![
                node(1, "workstation"),
                node(4, "switch"),
                node(2, "switch"),
                node(3, "server"),
            ])
        };

        let a = merge_paths(vec![p1(), p2()], NodeIdentity(1), NodeIdentity(3));
        let b = merge_paths(vec![p2(), p1()], NodeIdentity(1), NodeIdentity(3));

        let a_edges: Vec<(i64, i64)> = a.edges.iter().map(|e| (e.from.0, e.to.0)).collect();
        let b_edges: Vec<(i64, i64)> = b.edges.iter().map(|e| (e.from.0, e.to.0)).collect();
        assert_eq!(a_edges, b_edges);

        let a_pos: Vec<Vec<usize>> = a.nodes.values().map(|n| n.positions.clone()).collect();
        let b_pos: Vec<Vec<usize>> = b.nodes.values().map(|n| n.positions.clone()).collect();
        assert_eq!(a_pos, b_pos);
    }

    #[test]
    fn empty_input_yields_empty_graph() {
        let merged = merge_paths(Vec::new(), NodeIdentity(1), NodeIdentity(3));
        assert!(merged.is_empty());
        assert!(merged.edges.is_empty());
    }
}
