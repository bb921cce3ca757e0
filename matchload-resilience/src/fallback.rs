//! Best-effort fallback chains
//!
//! A chain is an ordered list of named steps. Steps run one after another
//! until one succeeds; failures are collected, logged at debug level and
//! never returned as errors. Steps are lazy futures, so a later step issues
//! nothing unless every earlier step failed.

use futures::future::BoxFuture;
use log::debug;
use std::fmt;
use std::future::Future;

/// One failed step of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: String,
}

/// Result of running a chain; never an error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// Name of the step that succeeded, if any
    pub succeeded: Option<&'static str>,
    pub failures: Vec<StepFailure>,
}

impl FallbackOutcome {
    pub fn is_success(&self) -> bool {
        self.succeeded.is_some()
    }

    /// Every step ran and every step failed
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_none() && !self.failures.is_empty()
    }
}

struct FallbackStep<'a, E> {
    name: &'static str,
    action: BoxFuture<'a, Result<(), E>>,
}

/// Ordered list of fallback actions
pub struct FallbackChain<'a, E> {
    steps: Vec<FallbackStep<'a, E>>,
}

impl<'a, E: fmt::Display> Default for FallbackChain<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> FallbackChain<'a, E>
where
    E: fmt::Display,
{
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step that is only awaited if all earlier steps failed
    pub fn step<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.steps.push(FallbackStep {
            name,
            action: Box::pin(action),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run steps in order until one succeeds
    pub async fn run(self) -> FallbackOutcome {
        let mut outcome = FallbackOutcome::default();

        for step in self.steps {
            match step.action.await {
                Ok(()) => {
                    outcome.succeeded = Some(step.name);
                    return outcome;
                }
                Err(e) => {
                    debug!("Fallback step '{}' failed: {}", step.name, e);
                    outcome.failures.push(StepFailure {
                        step: step.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let calls = AtomicU32::new(0);

        let outcome = FallbackChain::<String>::new()
            .step("leave", async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .step("ack", async {
                calls.fetch_add(10, Ordering::SeqCst);
                Ok(())
            })
            .run()
            .await;

        assert_eq!(outcome.succeeded, Some("leave"));
        assert!(outcome.failures.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_step() {
        let outcome = FallbackChain::new()
            .step("leave", async { Err("connection refused") })
            .step("ack", async { Ok(()) })
            .run()
            .await;

        assert_eq!(outcome.succeeded, Some("ack"));
        assert_eq!(
            outcome.failures,
            vec![StepFailure {
                step: "leave",
                error: "connection refused".to_string()
            }]
        );
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_all_failures_are_swallowed() {
        let outcome = FallbackChain::new()
            .step("leave", async { Err("503") })
            .step("ack", async { Err("timeout") })
            .run()
            .await;

        assert!(outcome.all_failed());
        assert_eq!(outcome.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = FallbackChain::<String>::new();
        assert!(chain.is_empty());

        let outcome = chain.run().await;
        assert!(!outcome.is_success());
        assert!(!outcome.all_failed());
    }
}
