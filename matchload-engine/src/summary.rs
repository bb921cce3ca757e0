//! End-of-run summary and pass/fail thresholds

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use matchload_config::ThresholdsConfig;
use matchload_core::{LatencySummary, MetricsSnapshot, RateSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One evaluated threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub metric: String,
    pub expression: String,
    /// `None` when the metric never received a sample
    pub observed: Option<f64>,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    pub checks: Vec<ThresholdCheck>,
}

impl ThresholdReport {
    /// Evaluate the request latency, request failure and match success
    /// thresholds. A metric with no samples fails its threshold.
    pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &ThresholdsConfig) -> Self {
        let p95_limit_ms = thresholds.request_duration_p95.as_secs_f64() * 1000.0;
        let p95 = (!snapshot.request_duration.is_empty()).then_some(snapshot.request_duration.p95_ms);
        let failed_rate = snapshot.request_failed_rate.rate;
        let success_rate = snapshot.match_success_rate.rate;

        let checks = vec![
            ThresholdCheck {
                metric: "http_req_duration".to_string(),
                expression: format!("p(95)<{}ms", p95_limit_ms),
                observed: p95,
                passed: p95.is_some_and(|value| value < p95_limit_ms),
            },
            ThresholdCheck {
                metric: "http_req_failed".to_string(),
                expression: format!("rate<{}", thresholds.max_request_failure_rate),
                observed: failed_rate,
                passed: failed_rate.is_some_and(|rate| rate < thresholds.max_request_failure_rate),
            },
            ThresholdCheck {
                metric: "match_success_rate".to_string(),
                expression: format!("rate>{}", thresholds.min_match_success_rate),
                observed: success_rate,
                passed: success_rate.is_some_and(|rate| rate > thresholds.min_match_success_rate),
            },
        ];

        Self { checks }
    }

    /// The run is acceptable only if every threshold holds
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ThresholdCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

/// Everything a finished run reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub population: usize,
    pub slots_started: usize,
    pub slots_interrupted: usize,
    pub total_cycles: u64,
    pub metrics: MetricsSnapshot,
    pub thresholds: ThresholdReport,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.thresholds.passed()
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the summary as pretty-printed JSON
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| EngineError::Export {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn format_rate(summary: &RateSummary) -> String {
    match summary.rate {
        Some(rate) => format!(
            "{:.2}% ({} of {})",
            rate * 100.0,
            summary.hits.max(0),
            summary.samples
        ),
        None => "no samples".to_string(),
    }
}

fn format_latency(summary: &LatencySummary) -> String {
    if summary.is_empty() {
        return "no samples".to_string();
    }
    format!(
        "avg={:.2}ms min={:.2}ms p(50)={:.2}ms p(90)={:.2}ms p(95)={:.2}ms p(99)={:.2}ms max={:.2}ms count={}",
        summary.mean_ms,
        summary.min_ms,
        summary.p50_ms,
        summary.p90_ms,
        summary.p95_ms,
        summary.p99_ms,
        summary.max_ms,
        summary.count
    )
}

impl fmt::Display for ThresholdCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "PASS" } else { "FAIL" };
        match self.observed {
            Some(value) => write!(
                f,
                "[{}] {} {} (observed {:.4})",
                verdict, self.metric, self.expression, value
            ),
            None => write!(
                f,
                "[{}] {} {} (no samples)",
                verdict, self.metric, self.expression
            ),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = &self.metrics;
        let outcomes = &metrics.outcomes;

        writeln!(f, "matchload run summary")?;
        writeln!(f, "  started:             {}", self.started_at.to_rfc3339())?;
        writeln!(
            f,
            "  duration:            {:.1}s",
            self.elapsed_ms as f64 / 1000.0
        )?;
        writeln!(
            f,
            "  virtual users:       {} of {} started, {} interrupted",
            self.slots_started, self.population, self.slots_interrupted
        )?;
        writeln!(f, "  cycles:              {}", self.total_cycles)?;
        writeln!(f)?;
        writeln!(
            f,
            "  match_success_rate:  {}",
            format_rate(&metrics.match_success_rate)
        )?;
        writeln!(
            f,
            "  match_timeout_rate:  {}",
            format_rate(&metrics.match_timeout_rate)
        )?;
        writeln!(
            f,
            "  match_latency:       {}",
            format_latency(&metrics.match_latency)
        )?;
        writeln!(
            f,
            "  http_req_failed:     {}",
            format_rate(&metrics.request_failed_rate)
        )?;
        writeln!(
            f,
            "  http_req_duration:   {}",
            format_latency(&metrics.request_duration)
        )?;
        for (endpoint, counts) in &metrics.endpoints {
            writeln!(
                f,
                "    {:<8} {} requests, {} failed",
                endpoint, counts.requests, counts.failures
            )?;
        }
        writeln!(
            f,
            "  outcomes:            live={} recovered={} abandoned={} failed={}",
            outcomes.live_matches, outcomes.recovered_matches, outcomes.abandoned, outcomes.failed
        )?;
        writeln!(f, "  join conflicts:      {}", metrics.join_conflicts)?;
        writeln!(
            f,
            "  cleanup:             {} attempts, {} fully failed",
            metrics.cleanup_attempts, metrics.cleanup_failures
        )?;
        writeln!(f)?;
        writeln!(f, "thresholds:")?;
        for check in &self.thresholds.checks {
            writeln!(f, "  {}", check)?;
        }
        Ok(())
    }
}
