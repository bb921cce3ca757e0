//! Per-cycle timing configuration for virtual users

use crate::error::ConfigResult;
use crate::validation::{validate_bounded_duration, validate_positive_duration, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive interval a randomized sleep is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    fn validate_in(&self, field_name: &str, domain: &str) -> ConfigResult<()> {
        if self.min > self.max {
            return Err(crate::error::ConfigError::DomainError {
                domain: domain.to_string(),
                message: format!(
                    "{}.min ({:?}) must not exceed {}.max ({:?})",
                    field_name, self.min, field_name, self.max
                ),
            });
        }
        validate_bounded_duration(self.max, &format!("{}.max", field_name), domain)
    }
}

/// Timing of the join / poll / resolve / wait cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Delay between two status polls
    #[serde(with = "humantime_serde", default = "default_polling_interval")]
    pub polling_interval: Duration,

    /// How long a cycle polls for a match before timing out
    #[serde(with = "humantime_serde", default = "default_match_timeout")]
    pub match_timeout: Duration,

    /// Sleep after a successful match, simulating post-match engagement
    #[serde(default = "default_success_cooldown")]
    pub success_cooldown: DelayRange,

    /// Sleep after a failed or abandoned cycle
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: DelayRange,

    /// Short per-call timeout for cleanup requests and the post-timeout
    /// status re-check
    #[serde(with = "humantime_serde", default = "default_cleanup_timeout")]
    pub cleanup_timeout: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            polling_interval: default_polling_interval(),
            match_timeout: default_match_timeout(),
            success_cooldown: default_success_cooldown(),
            retry_backoff: default_retry_backoff(),
            cleanup_timeout: default_cleanup_timeout(),
        }
    }
}

impl Validatable for CycleConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive_duration(self.polling_interval, "polling_interval", self.domain_name())?;
        validate_positive_duration(self.match_timeout, "match_timeout", self.domain_name())?;
        validate_positive_duration(self.cleanup_timeout, "cleanup_timeout", self.domain_name())?;
        for (value, field_name) in [
            (self.polling_interval, "polling_interval"),
            (self.match_timeout, "match_timeout"),
            (self.cleanup_timeout, "cleanup_timeout"),
        ] {
            validate_bounded_duration(value, field_name, self.domain_name())?;
        }
        self.success_cooldown
            .validate_in("success_cooldown", self.domain_name())?;
        self.retry_backoff
            .validate_in("retry_backoff", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cycle"
    }
}

fn default_polling_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_match_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_success_cooldown() -> DelayRange {
    DelayRange::new(Duration::from_secs(1), Duration::from_secs(3))
}

fn default_retry_backoff() -> DelayRange {
    DelayRange::new(Duration::from_secs(1), Duration::from_secs(3))
}

fn default_cleanup_timeout() -> Duration {
    Duration::from_secs(2)
}
