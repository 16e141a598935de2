//! Error types for the breachmap-attack crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttackError {
    #[error("Graph error: {0}")]
    Graph(#[from] breachmap_graph::GraphError),

    #[error("Query timeout: exceeded {max_seconds}s limit")]
    Timeout { max_seconds: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AttackError>;
