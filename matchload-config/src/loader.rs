//! Configuration loading and environment variable handling

use crate::domains::utils::parse_duration_value;
use crate::domains::MatchloadConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "MATCHLOAD".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<MatchloadConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_yaml_str(&content)
    }

    /// Parse YAML content, then apply environment overrides and validate
    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<MatchloadConfig> {
        let mut config: MatchloadConfig = if content.trim().is_empty() {
            MatchloadConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<MatchloadConfig> {
        let mut config = MatchloadConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<MatchloadConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut MatchloadConfig) -> ConfigResult<()> {
        if let Some(base_url) = self.get_env_var("BASE_URL") {
            config.target.base_url = base_url;
        }

        self.apply_load_overrides(&mut config.load)?;
        self.apply_cycle_overrides(&mut config.cycle)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_threshold_overrides(&mut config.thresholds)?;

        if let Some(path) = self.get_env_var("ROSTER_PATH") {
            config.roster.path = path.into();
        }

        Ok(())
    }

    /// Apply load shape overrides
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Some(population) = self.parse_env_var::<usize>("VU")? {
            config.population = population;
        }
        if let Some(ramp_up) = self.duration_env_var("RAMP_UP")? {
            config.ramp_up = ramp_up;
        }
        if let Some(steady) = self.duration_env_var("DURATION")? {
            config.steady = steady;
        }
        if let Some(ramp_down) = self.duration_env_var("RAMP_DOWN")? {
            config.ramp_down = ramp_down;
        }
        if let Some(interval) = self.duration_env_var("PROGRESS_INTERVAL")? {
            config.progress_interval = interval;
        }
        Ok(())
    }

    /// Apply cycle timing overrides
    fn apply_cycle_overrides(
        &self,
        config: &mut crate::domains::cycle::CycleConfig,
    ) -> ConfigResult<()> {
        if let Some(interval) = self.duration_env_var("POLLING_INTERVAL")? {
            config.polling_interval = interval;
        }
        if let Some(timeout) = self.duration_env_var("TIMEOUT")? {
            config.match_timeout = timeout;
        }
        if let Some(timeout) = self.duration_env_var("CLEANUP_TIMEOUT")? {
            config.cleanup_timeout = timeout;
        }
        if let Some(min) = self.duration_env_var("SUCCESS_COOLDOWN_MIN")? {
            config.success_cooldown.min = min;
        }
        if let Some(max) = self.duration_env_var("SUCCESS_COOLDOWN_MAX")? {
            config.success_cooldown.max = max;
        }
        if let Some(min) = self.duration_env_var("RETRY_BACKOFF_MIN")? {
            config.retry_backoff.min = min;
        }
        if let Some(max) = self.duration_env_var("RETRY_BACKOFF_MAX")? {
            config.retry_backoff.max = max;
        }
        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(timeout) = self.duration_env_var("HTTP_TIMEOUT")? {
            config.request_timeout = timeout;
        }
        if let Some(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Some(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Some(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply threshold overrides
    fn apply_threshold_overrides(
        &self,
        config: &mut crate::domains::thresholds::ThresholdsConfig,
    ) -> ConfigResult<()> {
        if let Some(p95) = self.duration_env_var("THRESHOLD_P95")? {
            config.request_duration_p95 = p95;
        }
        if let Some(rate) = self.parse_env_var::<f64>("THRESHOLD_FAILURE_RATE")? {
            config.max_request_failure_rate = rate;
        }
        if let Some(rate) = self.parse_env_var::<f64>("THRESHOLD_SUCCESS_RATE")? {
            config.min_match_success_rate = rate;
        }
        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_env_var(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))
            })
            .transpose()
    }

    fn duration_env_var(&self, name: &str) -> ConfigResult<Option<Duration>> {
        self.get_env_var(name)
            .map(|value| {
                parse_duration_value(&value)
                    .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))
            })
            .transpose()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
