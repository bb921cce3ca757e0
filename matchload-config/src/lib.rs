//! Domain-driven configuration management for matchload
//!
//! Configuration is split by functional domain, each with its own defaults
//! and validation. Values come from an optional YAML file and are then
//! overridden by `MATCHLOAD_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    cycle::{CycleConfig, DelayRange},
    http::HttpConfig,
    load::LoadConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    roster::RosterConfig,
    target::TargetConfig,
    thresholds::ThresholdsConfig,
    MatchloadConfig,
};

// Re-export utilities
pub use domains::utils::parse_duration_value;
