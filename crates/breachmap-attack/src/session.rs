//! UI-facing session state machine with stale-result discard.
//!
//! The session is long-lived and single-threaded from the caller's point of
//! view: every target/start change bumps a monotonically increasing
//! generation, and a query result may only be committed under the generation
//! that triggered it. A result arriving after its query was superseded is
//! dropped, never merged with newer state, so results apply in the order
//! their triggering change was most recent rather than in arrival order.

use uuid::Uuid;

use breachmap_core::types::NodeIdentity;

use crate::render::LayoutGraph;

/// Token captured when a query starts; checked before state commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// What a finished query produced.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// At least one path survived the pipeline.
    Paths { layout: LayoutGraph, path_count: usize },
    /// The query ran (or failed) and produced nothing usable.
    Empty,
}

/// Session states, in the order a user typically walks them.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing selected yet.
    NoTarget,
    /// A target device is selected; no start picked, no query running.
    TargetSelected { target: String },
    /// A start was picked and the path query is in flight.
    Loading { target: String, start: NodeIdentity },
    /// Paths arrived and are ready to render.
    Ready {
        target: String,
        start: NodeIdentity,
        layout: LayoutGraph,
        path_count: usize,
    },
    /// The query finished with zero paths; the UI shows the fallback node.
    Unreachable { target: String, start: NodeIdentity },
}

/// One user's attack-graph session.
pub struct AttackSession {
    /// Correlation id for log lines.
    pub id: Uuid,
    generation: u64,
    state: SessionState,
}

impl AttackSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            state: SessionState::NoTarget,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Select (or switch) the attack target. Supersedes any in-flight query.
    pub fn select_target(&mut self, device_element_id: impl Into<String>) {
        self.generation += 1;
        self.state = SessionState::TargetSelected {
            target: device_element_id.into(),
        };
    }

    /// Clear everything back to the initial state.
    pub fn clear_target(&mut self) {
        self.generation += 1;
        self.state = SessionState::NoTarget;
    }

    /// Pick a start node and begin loading. Returns the generation token to
    /// carry alongside the query; `None` when no target is selected (the
    /// gateway must not be queried in that case).
    pub fn select_start(&mut self, start: NodeIdentity) -> Option<Generation> {
        let target = match &self.state {
            SessionState::NoTarget => return None,
            SessionState::TargetSelected { target }
            | SessionState::Loading { target, .. }
            | SessionState::Ready { target, .. }
            | SessionState::Unreachable { target, .. } => target.clone(),
        };

        self.generation += 1;
        tracing::debug!(
            session = %self.id,
            generation = self.generation,
            start = start.0,
            "Start selected, query begins"
        );
        self.state = SessionState::Loading { target, start };
        Some(Generation(self.generation))
    }

    /// Clear the start selection, returning to the target-selected state and
    /// superseding any in-flight query.
    pub fn clear_start(&mut self) {
        let target = match &self.state {
            SessionState::NoTarget => return,
            SessionState::TargetSelected { target }
            | SessionState::Loading { target, .. }
            | SessionState::Ready { target, .. }
            | SessionState::Unreachable { target, .. } => target.clone(),
        };
        self.generation += 1;
        self.state = SessionState::TargetSelected { target };
    }

    /// Commit a query result. Returns `false` (and changes nothing) when the
    /// generation is stale, i.e. a newer change superseded the query.
    pub fn commit(&mut self, generation: Generation, outcome: QueryOutcome) -> bool {
        if generation.0 != self.generation {
            tracing::debug!(
                session = %self.id,
                stale = generation.0,
                current = self.generation,
                "Dropping superseded query result"
            );
            return false;
        }

        let (target, start) = match &self.state {
            SessionState::Loading { target, start } => (target.clone(), *start),
            // A matching generation outside Loading cannot happen: every
            // transition out of Loading bumps the generation.
            _ => return false,
        };

        self.state = match outcome {
            QueryOutcome::Paths { layout, path_count } => SessionState::Ready {
                target,
                start,
                layout,
                path_count,
            },
            QueryOutcome::Empty => SessionState::Unreachable { target, start },
        };
        true
    }
}

impl Default for AttackSession {
    fn default() -> Self {
        Self::new()
    }
}
