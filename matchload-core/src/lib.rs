//! Core domain models for matchload
//!
//! This crate holds the pieces every virtual user shares:
//! - the fixed identity roster and the round-robin assignment formula
//! - the ramp schedule and its cleanup-only boundary
//! - the process-wide metrics aggregator

pub mod assignment;
pub mod error;
pub mod metrics;
pub mod roster;
pub mod schedule;

// Re-export main types for convenience
pub use assignment::roster_index;
pub use error::{MetricsError, RosterError};
pub use metrics::{
    Endpoint, EndpointSummary, LatencyMetric, LatencySummary, MetricsAggregator, MetricsSnapshot,
    OutcomeCounts, OutcomeKind, RateMetric, RateSummary,
};
pub use roster::{Gender, Identity, Roster};
pub use schedule::{compute_schedule, is_cleanup_only, Schedule, Stage};
