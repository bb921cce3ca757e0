//! Utility functions and helpers for configuration

use std::time::Duration;

/// Parse a duration the way the environment overrides accept them: a bare
/// number is seconds (`"30"`, `"0.1"`), anything else is a humantime string
/// (`"30s"`, `"5m"`, `"100ms"`)
pub fn parse_duration_value(value: &str) -> Result<Duration, String> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("'{}' is not a non-negative number of seconds", value));
        }
        return Duration::try_from_secs_f64(seconds)
            .map_err(|e| format!("'{}' seconds: {}", value, e));
    }

    humantime::parse_duration(value).map_err(|e| format!("'{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_seconds() {
        assert_eq!(parse_duration_value("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration_value("0.1").unwrap(), Duration::from_millis(100));
        assert!(parse_duration_value("-1").is_err());
    }

    #[test]
    fn test_parse_out_of_range_seconds() {
        assert!(parse_duration_value("1e30").is_err());
        assert!(parse_duration_value("inf").is_err());
        assert!(parse_duration_value("NaN").is_err());
    }

    #[test]
    fn test_parse_humantime() {
        assert_eq!(parse_duration_value("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration_value("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration_value(" 30s ").unwrap(), Duration::from_secs(30));
        assert!(parse_duration_value("soon").is_err());
    }
}
