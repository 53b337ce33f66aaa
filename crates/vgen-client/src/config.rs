//! Client configuration.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Veo client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (without the version path)
    pub base_url: String,
    /// Delay between polls of the long-running operation
    pub poll_interval: Duration,
    /// Give up on an operation after this long
    pub max_poll_duration: Duration,
    /// Timeout for a single HTTP request
    pub request_timeout: Duration,
    /// Retry policy for transient poll/download failures
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            max_poll_duration: Duration::from_secs(600), // 10 minutes
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::new("veo_request"),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            poll_interval: Duration::from_secs(
                std::env::var("VEO_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_poll_duration: Duration::from_secs(
                std::env::var("VEO_MAX_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("VEO_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            retry: RetryConfig::new("veo_request"),
        }
    }

    /// Point the client at another endpoint (used for tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the maximum time spent polling one operation.
    pub fn with_max_poll_duration(mut self, max_poll_duration: Duration) -> Self {
        self.max_poll_duration = max_poll_duration;
        self
    }
}
