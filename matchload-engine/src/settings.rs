//! Run-time settings derived from configuration

use matchload_config::MatchloadConfig;
use matchload_resilience::UniformDelay;
use std::time::Duration;

/// Timing of a single cycle, shared by every virtual user
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub polling_interval: Duration,
    /// Polling deadline, measured from the start of the cycle
    pub match_timeout: Duration,
    /// Upper bound for join, status and ack calls
    pub request_timeout: Duration,
    /// Timeout for cleanup calls and the status re-check after a timeout
    pub cleanup_timeout: Duration,
    pub success_cooldown: UniformDelay,
    pub retry_backoff: UniformDelay,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from(&MatchloadConfig::default())
    }
}

impl From<&MatchloadConfig> for CycleSettings {
    fn from(config: &MatchloadConfig) -> Self {
        let cycle = &config.cycle;
        Self {
            polling_interval: cycle.polling_interval,
            match_timeout: cycle.match_timeout,
            request_timeout: config.http.request_timeout,
            cleanup_timeout: cycle.cleanup_timeout,
            success_cooldown: UniformDelay::new(
                cycle.success_cooldown.min,
                cycle.success_cooldown.max,
            ),
            retry_backoff: UniformDelay::new(cycle.retry_backoff.min, cycle.retry_backoff.max),
        }
    }
}

/// Population size and stage durations of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub population: usize,
    pub ramp_up: Duration,
    pub steady: Duration,
    pub ramp_down: Duration,
    pub progress_interval: Duration,
}

impl From<&MatchloadConfig> for RunPlan {
    fn from(config: &MatchloadConfig) -> Self {
        Self {
            population: config.load.population,
            ramp_up: config.load.ramp_up,
            steady: config.load.steady,
            ramp_down: config.load.ramp_down,
            progress_interval: config.load.progress_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = MatchloadConfig::default();
        config.http.request_timeout = Duration::from_secs(5);
        config.load.population = 12;

        let cycle = CycleSettings::from(&config);
        assert_eq!(cycle.polling_interval, Duration::from_millis(100));
        assert_eq!(cycle.request_timeout, Duration::from_secs(5));
        assert_eq!(cycle.retry_backoff.max(), Duration::from_secs(3));

        let plan = RunPlan::from(&config);
        assert_eq!(plan.population, 12);
        assert_eq!(plan.steady, Duration::from_secs(300));
    }
}
