//! HTTP client for the matching service
//!
//! The engine talks to the service only through the [`MatchClient`] trait.
//! [`HttpMatchClient`] is the reqwest implementation; it shares one
//! connection pool across all virtual users and records every request into
//! the run's metrics aggregator.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpMatchClient, MatchClient};
pub use config::ClientConfig;
pub use errors::ClientError;
pub use types::{
    JoinOutcome, JoinRequest, QueueStateResponse, QueueStatus, StatusResponse, UserRequest,
};
