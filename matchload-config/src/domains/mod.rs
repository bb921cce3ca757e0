//! Domain-specific configuration modules

pub mod cycle;
pub mod http;
pub mod load;
pub mod logging;
pub mod roster;
pub mod target;
pub mod thresholds;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main matchload configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatchloadConfig {
    /// Matching service location
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Population size and stage durations
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Per-cycle timing
    #[serde(default)]
    pub cycle: cycle::CycleConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Identity roster location
    #[serde(default)]
    pub roster: roster::RosterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// End-of-run pass/fail thresholds
    #[serde(default)]
    pub thresholds: thresholds::ThresholdsConfig,
}

impl MatchloadConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.load.validate()?;
        self.cycle.validate()?;
        self.http.validate()?;
        self.roster.validate()?;
        self.logging.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = MatchloadConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
