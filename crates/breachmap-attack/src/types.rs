//! Request and response types for attack-graph computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use breachmap_core::types::NodeIdentity;

use crate::render::LayoutGraph;

/// Request to compute the attack graph for a selected target device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackGraphRequest {
    /// Device-layer element id of the attack target.
    pub device_element_id: String,
    /// Selected start node (Physical internal id). Absent means no path
    /// query runs and the base topology is returned instead.
    pub start_id: Option<NodeIdentity>,
    /// Partition override; defaults to the engine's active partition.
    pub partition: Option<String>,
}

/// How a computation concluded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// The device id did not resolve to a Physical node; the selection
    /// is ignored.
    TargetUnresolved,
    /// No start selected: no path query executed, base topology returned.
    NoStartSelected,
    /// The queries ran but found zero usable paths; fallback layout
    /// (start node only) returned.
    NoPathsFound,
    /// At least one path survived the pipeline.
    PathsFound,
}

/// Complete result of one attack-graph computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackGraphResult {
    pub status: ResultStatus,
    /// Resolved Physical id of the target, when resolution succeeded.
    pub target_id: Option<NodeIdentity>,
    pub layout: LayoutGraph,
    /// Raw paths that survived deduplication.
    pub path_count: usize,
    pub computation_ms: u64,
    pub computed_at: DateTime<Utc>,
}
