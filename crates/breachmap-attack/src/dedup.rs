//! Path deduplication: turning a raw query path into a cleaned node sequence.
//!
//! Raw paths come back with artifacts from path concatenation (back-to-back
//! repeats at pivot joins) and from undirected traversal (loops revisiting
//! the same endpoint). Cleaning removes both while letting infrastructure
//! nodes (switches, routers) recur non-consecutively, since the same switch
//! legitimately appears on branching segments.

use std::collections::HashSet;

use breachmap_core::types::{NodeIdentity, NodeInfo, PathKind, RawPath};

/// A raw path after consecutive-duplicate removal and endpoint-uniqueness
/// enforcement. Guaranteed to hold at least two nodes.
#[derive(Debug, Clone)]
pub struct CleanedPath {
    pub kind: PathKind,
    pub nodes: Vec<NodeInfo>,
}

impl CleanedPath {
    /// The identity sequence, used as a stable merge-ordering key.
    pub fn identity_sequence(&self) -> Vec<NodeIdentity> {
        self.nodes.iter().map(|n| n.identity).collect()
    }
}

/// Clean one raw path, or reject it entirely.
///
/// Walking in order, an entry is dropped when:
/// - its identity equals the previously kept entry's identity, or
/// - it is a non-infrastructure node whose identity was already kept
///   anywhere earlier in this path.
///
/// A result with fewer than two entries rejects the whole path. The
/// operation is idempotent: cleaning a cleaned path changes nothing.
pub fn clean_path(raw: &RawPath) -> Option<CleanedPath> {
    let mut kept: Vec<NodeInfo> = Vec::with_capacity(raw.nodes.len());
    let mut seen_endpoints: HashSet<NodeIdentity> = HashSet::new();

    for node in &raw.nodes {
        if let Some(last) = kept.last() {
            if last.identity == node.identity {
                continue;
            }
        }
        if !node.is_infrastructure() {
            if !seen_endpoints.insert(node.identity) {
                continue;
            }
        }
        kept.push(node.clone());
    }

    if kept.len() < 2 {
        return None;
    }
    Some(CleanedPath {
        kind: raw.kind,
        nodes: kept,
    })
}

/// Clean a batch of raw paths, discarding the rejected ones.
pub fn clean_paths(raw: &[RawPath]) -> Vec<CleanedPath> {
    raw.iter().filter_map(clean_path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use breachmap_core::types::NodeIdentity;

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

    fn raw(nodes: Vec<NodeInfo>) -> RawPath {
        RawPath::new(PathKind::Direct, nodes)
    }

    fn ids(path: &CleanedPath) -> Vec<i64> {
        path.nodes.iter().map(|n| n.identity.0).collect()
    }

    #[test]
    fn removes_consecutive_duplicates() {
        let path = raw(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(2, "switch"),
            node(3, "server"),
        ]);
        let cleaned = clean_path(&path).unwrap();
        assert_eq!(ids(&cleaned), vec![1, 2, 3]);
    }

    #[test]
    fn infrastructure_may_repeat_non_consecutively() {
        let path = raw(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
            node(2, "switch"),
            node(4, "server"),
        ]);
        let cleaned = clean_path(&path).unwrap();
        assert_eq!(ids(&cleaned), vec![1, 2, 3, 2, 4]);
    }

    #[test]
    fn endpoint_repeats_are_dropped_everywhere() {
        // Node 3 (a server) loops back later in the path.
        let path = raw(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
            node(4, "switch"),
            node(3, "server"),
            node(5, "server"),
        ]);
        let cleaned = clean_path(&path).unwrap();
        assert_eq!(ids(&cleaned), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn dropping_an_endpoint_cannot_leave_adjacent_duplicates() {
        // After dropping the second "3", the two occurrences of switch 2
        // become adjacent and must collapse too.
        let path = raw(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(3, "server"),
            node(1, "workstation"),
            node(2, "switch"),
            node(4, "server"),
        ]);
        let cleaned = clean_path(&path).unwrap();
        let sequence = ids(&cleaned);
        for pair in sequence.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn single_node_after_dedup_is_rejected() {
        let path = raw(vec![node(1, "workstation"), node(1, "workstation")]);
        assert!(clean_path(&path).is_none());

        let path = raw(vec![node(1, "workstation")]);
        assert!(clean_path(&path).is_none());

        let path = raw(vec![]);
        assert!(clean_path(&path).is_none());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let path = raw(vec![
            node(1, "workstation"),
            node(2, "switch"),
            node(2, "switch"),
            node(3, "server"),
            node(2, "switch"),
            node(3, "server"),
            node(4, "server"),
        ]);
        let once = clean_path(&path).unwrap();
        let twice = clean_path(&RawPath::new(once.kind, once.nodes.clone())).unwrap();
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn type_check_matches_substring_case_insensitive() {
        let path = raw(vec![
            node(1, "Workstation"),
            node(2, "Core-Switch"),
            node(3, "server"),
            node(2, "Core-Switch"),
            node(4, "server"),
        ]);
        let cleaned = clean_path(&path).unwrap();
        // "Core-Switch" counts as infrastructure, so the repeat survives.
        assert_eq!(ids(&cleaned), vec![1, 2, 3, 2, 4]);
    }

    #[test]
    fn batch_cleaning_drops_rejected_paths() {
        let good = raw(vec![node(1, "workstation"), node(2, "server")]);
        let bad = raw(vec![node(9, "workstation")]);
        let cleaned = clean_paths(&[bad, good]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(ids(&cleaned[0]), vec![1, 2]);
    }
}
