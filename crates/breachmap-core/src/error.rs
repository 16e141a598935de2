use thiserror::Error;

/// Top-level error type shared across Breachmap components.
#[derive(Error, Debug)]
pub enum BreachmapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
