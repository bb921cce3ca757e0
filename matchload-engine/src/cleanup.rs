//! Best-effort cleanup of a virtual user's queue state
//!
//! Runs when a cycle abandons the queue and once more when a virtual user
//! terminates. Leave is attempted first, acknowledge second; if both fail
//! the failure is counted and otherwise ignored.

use matchload_core::MetricsAggregator;
use matchload_http::{ClientError, MatchClient};
use matchload_resilience::{FallbackChain, FallbackOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct CleanupPath {
    client: Arc<dyn MatchClient>,
    metrics: Arc<MetricsAggregator>,
}

impl CleanupPath {
    pub fn new(client: Arc<dyn MatchClient>, metrics: Arc<MetricsAggregator>) -> Self {
        Self { client, metrics }
    }

    /// Leave, falling back to ack; never fails. Safe to repeat for the same
    /// user since the service treats both calls idempotently.
    pub async fn cleanup(&self, user_id: &str, timeout: Duration) -> FallbackOutcome {
        let outcome = FallbackChain::<ClientError>::new()
            .step("leave", self.client.leave(user_id, timeout))
            .step("ack", self.client.ack(user_id, timeout))
            .run()
            .await;

        self.metrics.record_cleanup(outcome.all_failed());
        match outcome.succeeded {
            Some(step) => debug!("Cleanup for {} succeeded via {}", user_id, step),
            None => debug!(
                "Cleanup for {} failed on every step, ignoring: {:?}",
                user_id, outcome.failures
            ),
        }
        outcome
    }
}
