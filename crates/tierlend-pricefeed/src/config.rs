//! Price feed configuration

use std::time::Duration;
use tierlend_common::ConfigError;

/// Default price API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Shortest allowed refresh interval
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Longest allowed refresh interval, also the default
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Default per-asset fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFeedConfig {
    /// Base URL of the price API, without trailing slash
    pub base_url: String,

    /// Timer refresh period, within [60s, 300s]
    pub refresh_interval: Duration,

    /// Bound on a single asset fetch
    pub fetch_timeout: Duration,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval: MAX_REFRESH_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl PriceFeedConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set refresh interval, clamped into the allowed range
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval.clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidSetting {
                key: "base_url".to_string(),
                reason: format!("{} is not an http(s) URL", self.base_url),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                key: "fetch_timeout".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
