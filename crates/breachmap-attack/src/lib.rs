//! breachmap-attack: Attack-path graph construction and layering.
//!
//! Queries the network property graph for all paths between a start and a
//! target device (direct simple paths plus pivot detours through another
//! subnet), merges them into one deduplicated graph, assigns each node a
//! deterministic topological depth, and emits a layout-ready structure for
//! the display sink.

pub mod dedup;
pub mod error;
pub mod level;
pub mod merge;
pub mod render;
pub mod session;
pub mod types;

pub use error::AttackError;
pub use session::{AttackSession, QueryOutcome, SessionState};
pub use types::{AttackGraphRequest, AttackGraphResult, ResultStatus};

use std::time::Duration;

use chrono::Utc;

use breachmap_core::types::{NodeIdentity, Partition, RawPath};
use breachmap_graph::GraphClient;

use crate::render::LayoutGraph;

/// Default bound on how long one path query may run before the session
/// surfaces a failed state instead of hanging.
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// The attack-graph computation engine.
///
/// Holds an injected graph client; no global connection state. All gateway
/// failures are absorbed at this boundary and converted to the empty-result
/// shape, so the merge/level stages only ever see well-formed input.
pub struct AttackGraphEngine {
    client: GraphClient,
    partition: Partition,
    query_timeout: Duration,
}

impl AttackGraphEngine {
    /// Create an engine over the default partition.
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            partition: Partition::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Scope queries to a different partition.
    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    /// Override the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Compute the attack graph for one request.
    ///
    /// Orchestrates: resolve target identity → (if a start is selected)
    /// collect raw paths under a bounded wait → dedup → merge → level →
    /// layout. With no start selected, no path query executes and the base
    /// topology is returned.
    pub async fn attack_graph(
        &self,
        request: AttackGraphRequest,
    ) -> error::Result<AttackGraphResult> {
        let started = std::time::Instant::now();
        let partition = request
            .partition
            .clone()
            .map(Partition)
            .unwrap_or_else(|| self.partition.clone());

        let target = self
            .client
            .resolve_physical_id(&partition, &request.device_element_id)
            .await?;

        let Some(target) = target else {
            // Unresolvable selection: silently ignored, no state change.
            tracing::warn!(
                device = %request.device_element_id,
                "Device id did not resolve to a Physical node"
            );
            return Ok(self.finish(
                ResultStatus::TargetUnresolved,
                None,
                LayoutGraph::default(),
                0,
                started,
            ));
        };

        let Some(start) = request.start_id else {
            // No start selected: no path query runs; the sink shows the
            // full base topology with physics layout.
            let topology = self.client.fetch_topology(&partition).await?;
            let layout = render::layout_topology(&topology);
            return Ok(self.finish(ResultStatus::NoStartSelected, Some(target), layout, 0, started));
        };

        let raw_paths = self.collect_paths(&partition, start, target).await;

        match build_attack_graph(&raw_paths, start, target) {
            Some((layout, path_count)) => {
                tracing::info!(
                    start = start.0,
                    target = target.0,
                    paths = path_count,
                    nodes = layout.nodes.len(),
                    edges = layout.edges.len(),
                    "Attack graph computed"
                );
                Ok(self.finish(ResultStatus::PathsFound, Some(target), layout, path_count, started))
            }
            None => {
                let layout = render::layout_fallback(start);
                Ok(self.finish(ResultStatus::NoPathsFound, Some(target), layout, 0, started))
            }
        }
    }

    /// The base topology for the active partition, layout-ready.
    pub async fn topology(&self) -> error::Result<LayoutGraph> {
        let topology = self.client.fetch_topology(&self.partition).await?;
        Ok(render::layout_topology(&topology))
    }

    /// Run the gateway queries under the bounded wait, converting every
    /// failure (including timeout) into the empty path set.
    async fn collect_paths(
        &self,
        partition: &Partition,
        start: NodeIdentity,
        target: NodeIdentity,
    ) -> Vec<RawPath> {
        let query = self.client.collect_attack_paths(partition, start, target);
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(Ok(paths)) => paths,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Path query failed; treating as no paths");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.query_timeout.as_secs(),
                    "Path query timed out; treating as no paths"
                );
                Vec::new()
            }
        }
    }

    fn finish(
        &self,
        status: ResultStatus,
        target_id: Option<NodeIdentity>,
        layout: LayoutGraph,
        path_count: usize,
        started: std::time::Instant,
    ) -> AttackGraphResult {
        AttackGraphResult {
            status,
            target_id,
            layout,
            path_count,
            computation_ms: started.elapsed().as_millis() as u64,
            computed_at: Utc::now(),
        }
    }
}

/// Pure pipeline from raw query paths to a layout-ready attack graph:
/// dedup → merge → level → layout. Returns `None` when no path survives
/// deduplication; the caller synthesizes the fallback layout.
pub fn build_attack_graph(
    raw_paths: &[RawPath],
    start: NodeIdentity,
    target: NodeIdentity,
) -> Option<(LayoutGraph, usize)> {
    let cleaned = dedup::clean_paths(raw_paths);
    if cleaned.is_empty() {
        return None;
    }
    let path_count = cleaned.len();
    let merged = merge::merge_paths(cleaned, start, target);
    let leveled = level::assign_levels(merged);
    Some((render::layout_attack_graph(&leveled), path_count))
}
