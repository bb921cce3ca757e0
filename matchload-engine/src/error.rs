//! Engine error types
//!
//! Failures inside a cycle never surface here; they become cycle outcomes.
//! These errors cover run setup, task supervision and summary export.

use matchload_core::MetricsError;
use matchload_http::ClientError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to create metrics aggregator: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Failed to create matching service client: {0}")]
    Client(#[from] ClientError),

    #[error("Virtual user task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to serialize run summary: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write run summary to {path:?}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
