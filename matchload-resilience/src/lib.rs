//! Resilience patterns for matchload
//!
//! This crate provides the building blocks the lifecycle engine uses to stay
//! well-behaved under failure: uniformly randomized waits, best-effort
//! fallback chains, and shutdown coordination with escalating urgency.

pub mod backoff;
pub mod fallback;
pub mod shutdown;

// Re-export commonly used types
pub use backoff::UniformDelay;
pub use fallback::{FallbackChain, FallbackOutcome, StepFailure};
pub use shutdown::{CleanupToken, ShutdownCoordinator, ShutdownError, ShutdownSignal};
