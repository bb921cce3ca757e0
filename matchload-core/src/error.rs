//! Core error types for matchload

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the identity roster
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read roster file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse roster: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Roster is empty")]
    Empty,

    #[error("Roster entry {0} has an empty userId")]
    EmptyId(usize),

    #[error("Duplicate userId in roster: {0}")]
    DuplicateId(String),
}

/// Errors raised while setting up metric streams
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to create latency histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),
}
