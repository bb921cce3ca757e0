//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a non-zero duration
pub fn validate_positive_duration(value: Duration, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_zero() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0", field_name),
        });
    }
    Ok(())
}

/// Longest duration any single setting or the whole run may span
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Validate that a duration does not exceed [`MAX_DURATION`]
pub fn validate_bounded_duration(value: Duration, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value > MAX_DURATION {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} of {:?} exceeds the maximum of {:?}",
                field_name, value, MAX_DURATION
            ),
        });
    }
    Ok(())
}

/// Validate a fraction in the closed range [0, 1]
pub fn validate_fraction(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be between 0 and 1, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate an http(s) URL
pub fn validate_http_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} scheme '{}' not supported (only http/https)", field_name, scheme),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1usize, "population", "load").is_ok());
        assert!(validate_positive(0usize, "population", "load").is_err());
    }

    #[test]
    fn test_validate_bounded_duration() {
        assert!(validate_bounded_duration(Duration::from_secs(30), "steady", "load").is_ok());
        assert!(validate_bounded_duration(MAX_DURATION, "steady", "load").is_ok());
        assert!(validate_bounded_duration(Duration::MAX, "steady", "load").is_err());
    }

    #[test]
    fn test_validate_fraction() {
        assert!(validate_fraction(0.0, "rate", "thresholds").is_ok());
        assert!(validate_fraction(1.0, "rate", "thresholds").is_ok());
        assert!(validate_fraction(1.5, "rate", "thresholds").is_err());
        assert!(validate_fraction(f64::NAN, "rate", "thresholds").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("http://localhost:8080", "base_url", "target").is_ok());
        assert!(validate_http_url("https://match.example.com", "base_url", "target").is_ok());
        assert!(validate_http_url("", "base_url", "target").is_err());
        assert!(validate_http_url("not-a-url", "base_url", "target").is_err());
        assert!(validate_http_url("ftp://example.com", "base_url", "target").is_err());
    }
}
