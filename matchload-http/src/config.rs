//! HTTP client configuration

use matchload_config::MatchloadConfig;
use std::time::Duration;

/// Settings for [`crate::HttpMatchClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the matching service
    pub base_url: String,

    /// Fallback timeout for calls that do not pass their own
    pub request_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        MatchloadConfig::default().into()
    }
}

impl From<&MatchloadConfig> for ClientConfig {
    fn from(config: &MatchloadConfig) -> Self {
        Self {
            base_url: config.target.base_url.clone(),
            request_timeout: config.http.request_timeout,
            user_agent: config.http.user_agent.clone(),
            pool_max_idle_per_host: config.http.pool_max_idle_per_host,
            pool_idle_timeout: config.http.pool_idle_timeout,
        }
    }
}

impl From<MatchloadConfig> for ClientConfig {
    fn from(config: MatchloadConfig) -> Self {
        Self::from(&config)
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
