//! Error types shared by the store, the resolver and both servers.

use std::io;

/// Failures raised by an [`AgentStore`](crate::storage::AgentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Agent with id '{0}' not found.")]
    AgentNotFound(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures raised when deciding which agent an operation targets.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Agent with id '{0}' not found.")]
    AgentNotFound(String),

    #[error("No agent id provided and no current agent is set.")]
    NoCurrentAgent,

    #[error(transparent)]
    Store(#[from] StoreError),
}
