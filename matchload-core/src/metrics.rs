//! Process-wide metrics aggregation
//!
//! One `MetricsAggregator` is created per run and handed to every virtual
//! user and to the HTTP client. All recording operations are commutative
//! accumulations, so concurrent writers need no ordering between them.
//!
//! Rate streams count samples and hits separately. A correction adjusts the
//! hit count of an already-recorded sample without adding a new sample, which
//! is how a timeout later found to be a match is reclassified.

use crate::error::MetricsError;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Highest latency the histograms track exactly (one hour, in microseconds)
const MAX_TRACKED_MICROS: u64 = 3_600_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

/// Rate streams, each holding {0,1} samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateMetric {
    MatchSuccess,
    MatchTimeout,
    RequestFailed,
}

impl RateMetric {
    pub fn name(&self) -> &'static str {
        match self {
            RateMetric::MatchSuccess => "match_success_rate",
            RateMetric::MatchTimeout => "match_timeout_rate",
            RateMetric::RequestFailed => "http_req_failed",
        }
    }
}

/// Latency distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyMetric {
    /// Time from queue-join to observed match
    MatchLatency,
    /// Duration of every HTTP request issued by the engine
    RequestDuration,
}

impl LatencyMetric {
    pub fn name(&self) -> &'static str {
        match self {
            LatencyMetric::MatchLatency => "match_latency",
            LatencyMetric::RequestDuration => "http_req_duration",
        }
    }
}

/// Matching service endpoints tracked per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Join,
    Status,
    Ack,
    Leave,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [Endpoint::Join, Endpoint::Status, Endpoint::Ack, Endpoint::Leave];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Join => "join",
            Endpoint::Status => "status",
            Endpoint::Ack => "ack",
            Endpoint::Leave => "leave",
        }
    }

    fn index(&self) -> usize {
        match self {
            Endpoint::Join => 0,
            Endpoint::Status => 1,
            Endpoint::Ack => 2,
            Endpoint::Leave => 3,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final classification of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    LiveMatch,
    RecoveredMatch,
    Abandoned,
    Failed,
}

#[derive(Debug, Default)]
struct RateStream {
    hits: AtomicI64,
    samples: AtomicU64,
}

impl RateStream {
    fn record(&self, hit: bool) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn correct(&self, delta: i64) {
        self.hits.fetch_add(delta, Ordering::Relaxed);
    }

    fn summary(&self) -> RateSummary {
        let samples = self.samples.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let rate = (samples > 0).then(|| hits.max(0) as f64 / samples as f64);
        RateSummary {
            samples,
            hits,
            rate,
        }
    }
}

struct LatencyStream {
    histogram: Mutex<Histogram<u64>>,
}

impl LatencyStream {
    fn new() -> Result<Self, MetricsError> {
        let histogram =
            Histogram::<u64>::new_with_bounds(1, MAX_TRACKED_MICROS, SIGNIFICANT_FIGURES)?;
        Ok(Self {
            histogram: Mutex::new(histogram),
        })
    }

    fn record(&self, latency: Duration) {
        let micros = latency.as_micros().min(MAX_TRACKED_MICROS as u128) as u64;
        self.histogram.lock().saturating_record(micros);
    }

    fn percentile_ms(&self, quantile: f64) -> Option<f64> {
        let histogram = self.histogram.lock();
        if histogram.len() == 0 {
            return None;
        }
        Some(micros_to_ms(histogram.value_at_quantile(quantile)))
    }

    fn summary(&self) -> LatencySummary {
        let histogram = self.histogram.lock();
        if histogram.len() == 0 {
            return LatencySummary::default();
        }
        LatencySummary {
            count: histogram.len(),
            min_ms: micros_to_ms(histogram.min()),
            mean_ms: histogram.mean() / 1000.0,
            p50_ms: micros_to_ms(histogram.value_at_quantile(0.50)),
            p90_ms: micros_to_ms(histogram.value_at_quantile(0.90)),
            p95_ms: micros_to_ms(histogram.value_at_quantile(0.95)),
            p99_ms: micros_to_ms(histogram.value_at_quantile(0.99)),
            max_ms: micros_to_ms(histogram.max()),
        }
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

#[derive(Debug, Default)]
struct EndpointCounters {
    requests: AtomicU64,
    failures: AtomicU64,
}

/// Shared sink for every observation made during a run
pub struct MetricsAggregator {
    match_success: RateStream,
    match_timeout: RateStream,
    request_failed: RateStream,
    match_latency: LatencyStream,
    request_duration: LatencyStream,
    endpoints: [EndpointCounters; 4],
    live_matches: AtomicU64,
    recovered_matches: AtomicU64,
    abandoned: AtomicU64,
    failed: AtomicU64,
    join_conflicts: AtomicU64,
    cleanup_attempts: AtomicU64,
    cleanup_failures: AtomicU64,
}

impl fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsAggregator")
            .field("match_success", &self.match_success)
            .field("match_timeout", &self.match_timeout)
            .field("request_failed", &self.request_failed)
            .finish_non_exhaustive()
    }
}

impl MetricsAggregator {
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            match_success: RateStream::default(),
            match_timeout: RateStream::default(),
            request_failed: RateStream::default(),
            match_latency: LatencyStream::new()?,
            request_duration: LatencyStream::new()?,
            endpoints: Default::default(),
            live_matches: AtomicU64::new(0),
            recovered_matches: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            join_conflicts: AtomicU64::new(0),
            cleanup_attempts: AtomicU64::new(0),
            cleanup_failures: AtomicU64::new(0),
        })
    }

    fn rate_stream(&self, metric: RateMetric) -> &RateStream {
        match metric {
            RateMetric::MatchSuccess => &self.match_success,
            RateMetric::MatchTimeout => &self.match_timeout,
            RateMetric::RequestFailed => &self.request_failed,
        }
    }

    fn latency_stream(&self, metric: LatencyMetric) -> &LatencyStream {
        match metric {
            LatencyMetric::MatchLatency => &self.match_latency,
            LatencyMetric::RequestDuration => &self.request_duration,
        }
    }

    /// Record a {0,1} sample on a rate stream
    pub fn record_rate(&self, metric: RateMetric, hit: bool) {
        self.rate_stream(metric).record(hit);
    }

    /// Adjust the hit count of previously recorded samples by `delta`
    /// (clamped to -1..=1) without adding a sample
    pub fn record_rate_correction(&self, metric: RateMetric, delta: i8) {
        let delta = delta.clamp(-1, 1);
        if delta == 0 {
            return;
        }
        debug!("Applying correction {} to {}", delta, metric.name());
        self.rate_stream(metric).correct(delta as i64);
    }

    pub fn record_latency(&self, metric: LatencyMetric, latency: Duration) {
        self.latency_stream(metric).record(latency);
    }

    /// Record one HTTP request: its duration, whether it failed, and the
    /// per-endpoint counters
    pub fn record_request(&self, endpoint: Endpoint, duration: Duration, failed: bool) {
        self.request_duration.record(duration);
        self.request_failed.record(failed);

        let counters = &self.endpoints[endpoint.index()];
        counters.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self, kind: OutcomeKind) {
        let counter = match kind {
            OutcomeKind::LiveMatch => &self.live_matches,
            OutcomeKind::RecoveredMatch => &self.recovered_matches,
            OutcomeKind::Abandoned => &self.abandoned,
            OutcomeKind::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join_conflict(&self) {
        self.join_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one cleanup chain run and whether every step in it failed
    pub fn record_cleanup(&self, all_steps_failed: bool) {
        self.cleanup_attempts.fetch_add(1, Ordering::Relaxed);
        if all_steps_failed {
            self.cleanup_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Arithmetic mean of a rate stream, `None` before the first sample
    pub fn rate(&self, metric: RateMetric) -> Option<f64> {
        self.rate_stream(metric).summary().rate
    }

    pub fn rate_summary(&self, metric: RateMetric) -> RateSummary {
        self.rate_stream(metric).summary()
    }

    /// Latency at `quantile` (0.0..=1.0) in milliseconds, `None` when empty
    pub fn percentile_ms(&self, metric: LatencyMetric, quantile: f64) -> Option<f64> {
        self.latency_stream(metric).percentile_ms(quantile)
    }

    pub fn latency_summary(&self, metric: LatencyMetric) -> LatencySummary {
        self.latency_stream(metric).summary()
    }

    pub fn outcomes(&self) -> OutcomeCounts {
        OutcomeCounts {
            live_matches: self.live_matches.load(Ordering::Relaxed),
            recovered_matches: self.recovered_matches.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Point-in-time view of everything recorded so far
    pub fn snapshot(&self) -> MetricsSnapshot {
        let endpoints = Endpoint::ALL
            .iter()
            .map(|endpoint| {
                let counters = &self.endpoints[endpoint.index()];
                (
                    endpoint.as_str().to_string(),
                    EndpointSummary {
                        requests: counters.requests.load(Ordering::Relaxed),
                        failures: counters.failures.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            match_success_rate: self.match_success.summary(),
            match_timeout_rate: self.match_timeout.summary(),
            request_failed_rate: self.request_failed.summary(),
            match_latency: self.match_latency.summary(),
            request_duration: self.request_duration.summary(),
            endpoints,
            outcomes: self.outcomes(),
            join_conflicts: self.join_conflicts.load(Ordering::Relaxed),
            cleanup_attempts: self.cleanup_attempts.load(Ordering::Relaxed),
            cleanup_failures: self.cleanup_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub samples: u64,
    pub hits: i64,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub requests: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub live_matches: u64,
    pub recovered_matches: u64,
    pub abandoned: u64,
    pub failed: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.live_matches + self.recovered_matches + self.abandoned + self.failed
    }
}

/// Serializable end-of-run view of the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub match_success_rate: RateSummary,
    pub match_timeout_rate: RateSummary,
    pub request_failed_rate: RateSummary,
    pub match_latency: LatencySummary,
    pub request_duration: LatencySummary,
    pub endpoints: BTreeMap<String, EndpointSummary>,
    pub outcomes: OutcomeCounts,
    pub join_conflicts: u64,
    pub cleanup_attempts: u64,
    pub cleanup_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rate_mean() {
        let metrics = MetricsAggregator::new().unwrap();
        assert_eq!(metrics.rate(RateMetric::MatchSuccess), None);

        metrics.record_rate(RateMetric::MatchSuccess, true);
        metrics.record_rate(RateMetric::MatchSuccess, true);
        metrics.record_rate(RateMetric::MatchSuccess, true);
        metrics.record_rate(RateMetric::MatchSuccess, false);

        assert_eq!(metrics.rate(RateMetric::MatchSuccess), Some(0.75));
    }

    #[test]
    fn test_correction_retracts_a_timeout_without_adding_a_sample() {
        let metrics = MetricsAggregator::new().unwrap();

        // live success
        metrics.record_rate(RateMetric::MatchTimeout, false);
        // provisional timeout, later found to be a match
        metrics.record_rate(RateMetric::MatchTimeout, true);
        metrics.record_rate_correction(RateMetric::MatchTimeout, -1);

        let summary = metrics.rate_summary(RateMetric::MatchTimeout);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.hits, 0);
        assert_eq!(summary.rate, Some(0.0));
    }

    #[test]
    fn test_correction_is_clamped() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record_rate(RateMetric::MatchTimeout, true);
        metrics.record_rate(RateMetric::MatchTimeout, true);

        metrics.record_rate_correction(RateMetric::MatchTimeout, -5);
        assert_eq!(metrics.rate_summary(RateMetric::MatchTimeout).hits, 1);

        metrics.record_rate_correction(RateMetric::MatchTimeout, 0);
        assert_eq!(metrics.rate_summary(RateMetric::MatchTimeout).hits, 1);
    }

    #[test]
    fn test_latency_percentiles() {
        let metrics = MetricsAggregator::new().unwrap();
        assert_eq!(metrics.percentile_ms(LatencyMetric::MatchLatency, 0.95), None);

        for ms in 1..=100 {
            metrics.record_latency(LatencyMetric::MatchLatency, Duration::from_millis(ms));
        }

        let p95 = metrics
            .percentile_ms(LatencyMetric::MatchLatency, 0.95)
            .unwrap();
        assert!((94.0..=96.0).contains(&p95), "p95 was {}", p95);

        let summary = metrics.latency_summary(LatencyMetric::MatchLatency);
        assert_eq!(summary.count, 100);
        assert!((summary.mean_ms - 50.5).abs() < 0.5);
        assert!(summary.max_ms >= 99.9);
    }

    #[test]
    fn test_zero_latency_is_recorded() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record_latency(LatencyMetric::RequestDuration, Duration::ZERO);

        let summary = metrics.latency_summary(LatencyMetric::RequestDuration);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.max_ms, 0.0);
    }

    #[test]
    fn test_record_request_feeds_streams_and_endpoints() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record_request(Endpoint::Join, Duration::from_millis(12), false);
        metrics.record_request(Endpoint::Status, Duration::from_millis(3), false);
        metrics.record_request(Endpoint::Status, Duration::from_millis(4), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.request_duration.count, 3);
        assert_eq!(snapshot.request_failed_rate.samples, 3);
        assert_eq!(snapshot.request_failed_rate.hits, 1);
        assert_eq!(snapshot.endpoints["status"].requests, 2);
        assert_eq!(snapshot.endpoints["status"].failures, 1);
        assert_eq!(snapshot.endpoints["ack"].requests, 0);
    }

    #[test]
    fn test_concurrent_recording_is_commutative() {
        let metrics = Arc::new(MetricsAggregator::new().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        metrics.record_rate(RateMetric::MatchSuccess, (worker + i) % 2 == 0);
                        metrics.record_latency(
                            LatencyMetric::MatchLatency,
                            Duration::from_millis(i as u64),
                        );
                        metrics.record_outcome(OutcomeKind::LiveMatch);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.match_success_rate.samples, 8000);
        assert_eq!(snapshot.match_success_rate.hits, 4000);
        assert_eq!(snapshot.match_latency.count, 8000);
        assert_eq!(snapshot.outcomes.live_matches, 8000);
        assert_eq!(snapshot.outcomes.total(), 8000);
    }
}
