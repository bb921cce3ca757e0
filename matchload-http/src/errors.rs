//! HTTP error types

use matchload_core::Endpoint;
use std::time::Duration;

/// Error type for matching service calls
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} request timed out after {timeout:?}")]
    Timeout { endpoint: Endpoint, timeout: Duration },

    #[error("Unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: Endpoint, status: u16 },

    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether a retry of the same call could reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Timeout { .. } | ClientError::InvalidBody(_)
        )
    }
}
