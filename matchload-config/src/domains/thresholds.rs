//! Pass/fail thresholds evaluated at the end of a run

use crate::error::ConfigResult;
use crate::validation::{validate_fraction, validate_positive_duration, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A run is acceptable only if all three thresholds hold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// p95 of all request durations must stay below this
    #[serde(with = "humantime_serde", default = "default_request_duration_p95")]
    pub request_duration_p95: Duration,

    /// Fraction of failed requests must stay below this
    #[serde(default = "default_max_request_failure_rate")]
    pub max_request_failure_rate: f64,

    /// Fraction of cycles ending in a match must exceed this
    #[serde(default = "default_min_match_success_rate")]
    pub min_match_success_rate: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            request_duration_p95: default_request_duration_p95(),
            max_request_failure_rate: default_max_request_failure_rate(),
            min_match_success_rate: default_min_match_success_rate(),
        }
    }
}

impl Validatable for ThresholdsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive_duration(
            self.request_duration_p95,
            "request_duration_p95",
            self.domain_name(),
        )?;
        validate_fraction(
            self.max_request_failure_rate,
            "max_request_failure_rate",
            self.domain_name(),
        )?;
        validate_fraction(
            self.min_match_success_rate,
            "min_match_success_rate",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "thresholds"
    }
}

fn default_request_duration_p95() -> Duration {
    Duration::from_millis(500)
}

fn default_max_request_failure_rate() -> f64 {
    0.01
}

fn default_min_match_success_rate() -> f64 {
    0.8
}
