//! Load shape configuration: population size and stage durations

use crate::error::ConfigResult;
use crate::validation::{
    validate_bounded_duration, validate_positive, validate_positive_duration, Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Population and ramp stages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of concurrent worker slots at full load
    #[serde(default = "default_population")]
    pub population: usize,

    /// Time over which the population grows from 0 to `population`
    #[serde(with = "humantime_serde", default = "default_ramp_up")]
    pub ramp_up: Duration,

    /// Time spent at full population
    #[serde(with = "humantime_serde", default = "default_steady")]
    pub steady: Duration,

    /// Grace window after the steady stage for in-flight cycles
    #[serde(with = "humantime_serde", default = "default_ramp_down")]
    pub ramp_down: Duration,

    /// How often progress is logged during a run
    #[serde(with = "humantime_serde", default = "default_progress_interval")]
    pub progress_interval: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            ramp_up: default_ramp_up(),
            steady: default_steady(),
            ramp_down: default_ramp_down(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl LoadConfig {
    /// Length of all three stages, saturating at `Duration::MAX`
    pub fn total_duration(&self) -> Duration {
        self.ramp_up
            .saturating_add(self.steady)
            .saturating_add(self.ramp_down)
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.population, "population", self.domain_name())?;
        validate_positive_duration(
            self.progress_interval,
            "progress_interval",
            self.domain_name(),
        )?;

        validate_bounded_duration(self.progress_interval, "progress_interval", self.domain_name())?;
        validate_bounded_duration(self.total_duration(), "total run duration", self.domain_name())?;

        if self.ramp_up.is_zero() && self.steady.is_zero() {
            return Err(self.validation_error(
                "ramp_up and steady cannot both be zero; no cycle could ever start",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

fn default_population() -> usize {
    1000
}

fn default_ramp_up() -> Duration {
    Duration::from_secs(30)
}

fn default_steady() -> Duration {
    Duration::from_secs(300)
}

fn default_ramp_down() -> Duration {
    Duration::from_secs(30)
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = LoadConfig::default();
        assert_eq!(config.population, 1000);
        assert_eq!(config.total_duration(), Duration::from_secs(360));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_validation() {
        let mut config = LoadConfig::default();
        config.population = 0;
        assert!(config.validate().is_err());

        let mut config = LoadConfig::default();
        config.ramp_up = Duration::ZERO;
        config.steady = Duration::ZERO;
        assert!(config.validate().is_err());

        // No ramp-down is fine: in-flight cycles still run to completion
        let mut config = LoadConfig::default();
        config.ramp_down = Duration::ZERO;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unschedulable_durations_are_rejected() {
        let mut config = LoadConfig::default();
        config.steady = humantime::parse_duration("500000000years").unwrap();
        assert!(config.validate().is_err());

        let mut config = LoadConfig::default();
        config.ramp_up = Duration::MAX;
        config.steady = Duration::MAX;
        assert_eq!(config.total_duration(), Duration::MAX);
        assert!(config.validate().is_err());
    }
}
