use anyhow::Result;
use matchload_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter from an explicit directive. `RUST_LOG` is consulted when no
/// directive is given or the given one does not parse, then `info`.
pub fn build_env_filter(log_level: Option<&str>) -> EnvFilter {
    log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(Some(config.level.as_str()));
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    // Use try_init to avoid panic if global subscriber already set
    let result = match config.format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Json => registry
            .with(layer.json().with_current_span(true).with_span_list(false))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: Option<&str>) -> Result<()> {
    let env_filter = build_env_filter(log_level);

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchload_config::LogLevel;

    #[test]
    fn test_filter_from_level() {
        temp_env::with_var("RUST_LOG", Some("error"), || {
            let filter = build_env_filter(Some("debug"));
            assert_eq!(filter.to_string(), "debug");
        });
    }

    #[test]
    fn test_filter_accepts_directives() {
        let filter = build_env_filter(Some("matchload_engine=trace,info"));
        assert!(filter.to_string().contains("matchload_engine=trace"));
    }

    #[test]
    fn test_filter_falls_back_to_rust_log() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            assert_eq!(build_env_filter(None).to_string(), "warn");
            assert_eq!(build_env_filter(Some("matchload=loud")).to_string(), "warn");
        });
        temp_env::with_var_unset("RUST_LOG", || {
            assert_eq!(build_env_filter(None).to_string(), "info");
        });
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            format: LogFormat::Json,
            include_location: true,
        };
        assert!(init_logging_from_config(&config).is_ok());
        assert!(init_logging_from_config(&LoggingConfig::default()).is_ok());
        assert!(init_simple_tracing(Some("info")).is_ok());
    }
}
