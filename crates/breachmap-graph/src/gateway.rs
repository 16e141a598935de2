//! Path-query gateway: the read operations feeding the attack-path pipeline.
//!
//! Two logical path queries per session, result-unioned:
//! 1. Direct: all simple paths of length 1..10 between start and target,
//!    restricted to edges carrying the active partition tag.
//! 2. Pivot: for up to five sampled pivot candidates (endpoint devices on a
//!    different /16 than the start), the concatenation of shortest paths
//!    start→pivot and pivot→target.
//!
//! Zero paths is a valid empty result, never an error.

use std::collections::{HashMap, HashSet};

use neo4rs::query;

use breachmap_core::types::{subnet16, NodeIdentity, NodeInfo, Partition, PathKind, RawPath};

use crate::client::{GraphClient, GraphError};

/// Cap on simple paths returned by the direct query.
const MAX_DIRECT_PATHS: usize = 10;
/// Pivot candidates actually expanded into paths.
const MAX_PIVOTS: usize = 5;
/// Random sample pool the pivot candidates are drawn from.
const PIVOT_SAMPLE_POOL: i64 = 25;
/// Hard cap on raw paths returned per session.
const MAX_TOTAL_PATHS: usize = 50;
/// Maximum hop count for both direct and shortest-path queries.
const MAX_HOPS: u32 = 10;

/// Composite-id prefix mapping Device-layer element ids onto Physical nodes.
const DEVICE_ID_PREFIX: &str = "ml:";

/// An undirected connection in the base topology, endpoints ordered
/// min-before-max so each pair appears once.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TopologyEdge {
    pub from: NodeIdentity,
    pub to: NodeIdentity,
}

/// The base Device topology for one partition.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TopologyResult {
    pub nodes: Vec<NodeInfo>,
    pub edges: Vec<TopologyEdge>,
}

impl GraphClient {
    // ── Identity Resolution ──────────────────────────────────────

    /// Translate a Device-layer element id into this graph's internal
    /// Physical node id via the prefixed composite id. A miss returns
    /// `None`; the caller treats that as a silent no-op.
    pub async fn resolve_physical_id(
        &self,
        partition: &Partition,
        device_element_id: &str,
    ) -> Result<Option<NodeIdentity>, GraphError> {
        let composite = format!("{DEVICE_ID_PREFIX}{device_element_id}");
        let q = query(
            "MATCH (p:Physical {project: $partition})
             WHERE p.id = $composite
             RETURN id(p) AS identity
             LIMIT 1",
        )
        .param("partition", partition.as_str())
        .param("composite", composite);

        match self.query_one(q).await? {
            Some(row) => {
                let identity: i64 = row.get("identity").map_err(|e| {
                    GraphError::Deserialization(format!("Failed to read physical id: {e}"))
                })?;
                Ok(Some(NodeIdentity(identity)))
            }
            None => Ok(None),
        }
    }

    // ── Base Topology ────────────────────────────────────────────

    /// Fetch the full Device topology for a partition: all nodes plus their
    /// partition-scoped connections, edges deduplicated by unordered pair.
    pub async fn fetch_topology(
        &self,
        partition: &Partition,
    ) -> Result<TopologyResult, GraphError> {
        let q = query(
            "MATCH (d:Physical {project: $partition})
             OPTIONAL MATCH (d)-[r:CONNECTED {project: $partition}]-(d2:Physical {project: $partition})
             RETURN d, d2",
        )
        .param("partition", partition.as_str());

        let rows = self.query_rows(q).await?;

        let mut nodes: HashMap<NodeIdentity, NodeInfo> = HashMap::new();
        let mut degrees: HashMap<NodeIdentity, u32> = HashMap::new();
        let mut edge_keys: HashSet<(NodeIdentity, NodeIdentity)> = HashSet::new();

        for row in rows {
            let d: neo4rs::Node = row.get("d").map_err(|e| {
                GraphError::Deserialization(format!("Failed to read topology node: {e}"))
            })?;
            let d_id = NodeIdentity(d.id());
            nodes.entry(d_id).or_insert_with(|| node_to_info(&d, 0));

            // OPTIONAL MATCH leaves d2 null for isolated devices.
            if let Ok(d2) = row.get::<neo4rs::Node>("d2") {
                let d2_id = NodeIdentity(d2.id());
                nodes.entry(d2_id).or_insert_with(|| node_to_info(&d2, 0));

                let key = (d_id.min(d2_id), d_id.max(d2_id));
                if edge_keys.insert(key) {
                    *degrees.entry(d_id).or_default() += 1;
                    *degrees.entry(d2_id).or_default() += 1;
                }
            }
        }

        let mut node_list: Vec<NodeInfo> = nodes
            .into_values()
            .map(|mut info| {
                info.degree = degrees.get(&info.identity).copied().unwrap_or(0);
                info
            })
            .collect();
        node_list.sort_by_key(|n| n.identity);

        let mut edge_list: Vec<TopologyEdge> = edge_keys
            .into_iter()
            .map(|(from, to)| TopologyEdge { from, to })
            .collect();
        edge_list.sort_by_key(|e| (e.from, e.to));

        Ok(TopologyResult {
            nodes: node_list,
            edges: edge_list,
        })
    }

    // ── Path Queries ─────────────────────────────────────────────

    /// All simple paths of length 1..10 between start and target, filtered
    /// to edges within the partition, capped at `MAX_DIRECT_PATHS`.
    pub async fn direct_paths(
        &self,
        partition: &Partition,
        start: NodeIdentity,
        target: NodeIdentity,
    ) -> Result<Vec<RawPath>, GraphError> {
        let cypher = format!(
            "MATCH (start:Physical), (target:Physical)
             WHERE id(start) = $start_id AND id(target) = $target_id
             MATCH p = (start)-[:CONNECTED*1..{MAX_HOPS}]-(target)
             WHERE all(r IN relationships(p) WHERE r.project = $partition)
             RETURN p
             LIMIT {MAX_DIRECT_PATHS}"
        );
        let q = query(&cypher)
            .param("partition", partition.as_str())
            .param("start_id", start.0)
            .param("target_id", target.0);

        let rows = self.query_rows(q).await?;
        let mut paths = Vec::with_capacity(rows.len());
        for row in rows {
            let path: neo4rs::Path = row.get("p").map_err(|e| {
                GraphError::Deserialization(format!("Failed to read direct path: {e}"))
            })?;
            paths.push(RawPath::new(PathKind::Direct, path_nodes(&path)));
        }

        tracing::debug!(
            start = start.0,
            target = target.0,
            count = paths.len(),
            "Direct path query complete"
        );
        Ok(paths)
    }

    /// Pivot paths: sample candidate endpoint devices on a different /16
    /// than the start, then join shortestPath(start→pivot) with
    /// shortestPath(pivot→target). The pivot node appears once at the join.
    pub async fn pivot_paths(
        &self,
        partition: &Partition,
        start: NodeIdentity,
        target: NodeIdentity,
        start_ip: Option<&str>,
    ) -> Result<Vec<RawPath>, GraphError> {
        let start_subnet = start_ip.and_then(subnet16);

        let q = query(&format!(
            "MATCH (pivot:Physical {{project: $partition}})
             WHERE id(pivot) <> $start_id AND id(pivot) <> $target_id
               AND pivot.ip IS NOT NULL
               AND NOT toLower(coalesce(pivot.type, '')) CONTAINS 'switch'
               AND NOT toLower(coalesce(pivot.type, '')) CONTAINS 'router'
             RETURN id(pivot) AS identity, pivot.ip AS ip
             ORDER BY rand()
             LIMIT {PIVOT_SAMPLE_POOL}"
        ))
        .param("partition", partition.as_str())
        .param("start_id", start.0)
        .param("target_id", target.0);

        let rows = self.query_rows(q).await?;

        let mut pivots = Vec::new();
        let mut seen = HashSet::new();
        for row in rows {
            let identity: i64 = row.get("identity").map_err(|e| {
                GraphError::Deserialization(format!("Failed to read pivot candidate: {e}"))
            })?;
            let ip: String = row.get("ip").unwrap_or_default();

            // A pivot must sit on a different /16 than the start. When the
            // start has no parseable ip every candidate qualifies.
            if let (Some(start_net), Some(pivot_net)) = (start_subnet, subnet16(&ip)) {
                if start_net == pivot_net {
                    continue;
                }
            }
            if seen.insert(identity) {
                pivots.push(NodeIdentity(identity));
            }
            if pivots.len() >= MAX_PIVOTS {
                break;
            }
        }

        let mut paths = Vec::new();
        for pivot in pivots {
            let Some(first) = self.shortest_path(partition, start, pivot).await? else {
                continue;
            };
            let Some(second) = self.shortest_path(partition, pivot, target).await? else {
                continue;
            };

            // Join at the pivot without duplicating it.
            let mut nodes = first;
            nodes.extend(second.into_iter().skip(1));
            paths.push(RawPath::new(PathKind::Pivot, nodes));
        }

        tracing::debug!(
            start = start.0,
            target = target.0,
            count = paths.len(),
            "Pivot path query complete"
        );
        Ok(paths)
    }

    /// Shortest partition-scoped path between two nodes, or `None` when
    /// unreachable.
    async fn shortest_path(
        &self,
        partition: &Partition,
        from: NodeIdentity,
        to: NodeIdentity,
    ) -> Result<Option<Vec<NodeInfo>>, GraphError> {
        let cypher = format!(
            "MATCH (a:Physical), (b:Physical)
             WHERE id(a) = $from_id AND id(b) = $to_id
             MATCH p = shortestPath((a)-[:CONNECTED*..{MAX_HOPS}]-(b))
             WHERE all(r IN relationships(p) WHERE r.project = $partition)
             RETURN p
             LIMIT 1"
        );
        let q = query(&cypher)
            .param("partition", partition.as_str())
            .param("from_id", from.0)
            .param("to_id", to.0);

        match self.query_one(q).await? {
            Some(row) => {
                let path: neo4rs::Path = row.get("p").map_err(|e| {
                    GraphError::Deserialization(format!("Failed to read shortest path: {e}"))
                })?;
                Ok(Some(path_nodes(&path)))
            }
            None => Ok(None),
        }
    }

    /// Run both path queries for one session and union the results, capped
    /// at `MAX_TOTAL_PATHS`. Per-node degrees are filled in with a single
    /// follow-up query across all distinct nodes seen.
    pub async fn collect_attack_paths(
        &self,
        partition: &Partition,
        start: NodeIdentity,
        target: NodeIdentity,
    ) -> Result<Vec<RawPath>, GraphError> {
        let start_info = self.fetch_node(start).await?;
        let start_ip = start_info.as_ref().and_then(|n| n.ip.clone());

        let mut paths = self.direct_paths(partition, start, target).await?;
        let pivot = self
            .pivot_paths(partition, start, target, start_ip.as_deref())
            .await?;
        paths.extend(pivot);
        paths.truncate(MAX_TOTAL_PATHS);

        self.fill_degrees(partition, &mut paths).await?;

        tracing::info!(
            start = start.0,
            target = target.0,
            total = paths.len(),
            "Collected raw attack paths"
        );
        Ok(paths)
    }

    /// Fetch a single Physical node by internal id.
    pub async fn fetch_node(
        &self,
        identity: NodeIdentity,
    ) -> Result<Option<NodeInfo>, GraphError> {
        let q = query(
            "MATCH (n:Physical)
             WHERE id(n) = $id
             RETURN n
             LIMIT 1",
        )
        .param("id", identity.0);

        match self.query_one(q).await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("n").map_err(|e| {
                    GraphError::Deserialization(format!("Failed to read node: {e}"))
                })?;
                Ok(Some(node_to_info(&node, 0)))
            }
            None => Ok(None),
        }
    }

    /// Annotate every path node with its degree within the partition.
    async fn fill_degrees(
        &self,
        partition: &Partition,
        paths: &mut [RawPath],
    ) -> Result<(), GraphError> {
        let ids: Vec<i64> = paths
            .iter()
            .flat_map(|p| p.nodes.iter().map(|n| n.identity.0))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        let q = query(
            "MATCH (n:Physical)
             WHERE id(n) IN $ids
             RETURN id(n) AS identity,
                    size([(n)-[r:CONNECTED]-(m) WHERE r.project = $partition | m]) AS deg",
        )
        .param("ids", ids)
        .param("partition", partition.as_str());

        let rows = self.query_rows(q).await?;
        let mut degrees: HashMap<i64, u32> = HashMap::with_capacity(rows.len());
        for row in rows {
            let identity: i64 = row.get("identity").unwrap_or_default();
            let deg: i64 = row.get("deg").unwrap_or_default();
            degrees.insert(identity, deg.max(0) as u32);
        }

        for path in paths {
            for node in &mut path.nodes {
                if let Some(&deg) = degrees.get(&node.identity.0) {
                    node.degree = deg;
                }
            }
        }
        Ok(())
    }
}

/// Properties lifted into the display bag. Everything the pipeline itself
/// interprets (`type`, `ip`) also gets a dedicated `NodeInfo` field.
const CARRIED_PROPERTIES: &[&str] = &[
    "type", "ip", "name", "label", "subnet", "zone", "os", "vendor", "model", "project",
];

/// Convert a neo4rs node into `NodeInfo`, populating the typed fields once
/// at ingestion so nothing downstream re-sniffs the property bag.
fn node_to_info(node: &neo4rs::Node, degree: u32) -> NodeInfo {
    let node_type: Option<String> = node.get("type").ok();
    let ip: Option<String> = node.get("ip").ok();
    // Display name precedence: `name`, then `label`, then the identity
    // (handled by `NodeInfo::label` at render time).
    let name: Option<String> = node
        .get::<String>("name")
        .ok()
        .or_else(|| node.get::<String>("label").ok());

    let mut props = serde_json::Map::new();
    for key in CARRIED_PROPERTIES {
        if let Ok(v) = node.get::<String>(key) {
            props.insert((*key).to_string(), serde_json::Value::String(v));
        }
    }

    NodeInfo {
        identity: NodeIdentity(node.id()),
        node_type,
        ip,
        name,
        degree,
        properties: serde_json::Value::Object(props),
    }
}

/// Ordered node list of a Bolt path record.
fn path_nodes(path: &neo4rs::Path) -> Vec<NodeInfo> {
    path.nodes().iter().map(|n| node_to_info(n, 0)).collect()
}
