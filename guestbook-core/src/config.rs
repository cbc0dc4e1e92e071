//! Client-side sync configuration.
//!
//! Loaded from environment variables with sensible defaults.

use std::time::Duration;

/// Default guestbook server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Consecutive transport errors tolerated before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Lifetime of a toast before it expires on its own.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

/// Duration of the "entry" cue on a freshly inserted tile.
pub const ENTER_CUE_DURATION: Duration = Duration::from_millis(1000);

/// Delay between the "exit" cue and the tile leaving the render list.
pub const EXIT_CUE_DURATION: Duration = Duration::from_millis(300);

/// Client configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the guestbook server (default: http://127.0.0.1:3000)
    pub server_url: String,
    /// Delay before each reconnect attempt (default: 3s)
    pub reconnect_delay: Duration,
    /// Reconnect ceiling (default: 5)
    pub max_reconnect_attempts: u32,
    /// Toast lifetime (default: 5s)
    pub toast_duration: Duration,
    /// Timeout for list/create/delete requests (default: 10s)
    pub request_timeout: Duration,
    /// Interval of the periodic list reload; `None` disables it (default: 60s)
    pub resync_interval: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            toast_duration: DEFAULT_TOAST_DURATION,
            request_timeout: Duration::from_secs(10),
            resync_interval: Some(Duration::from_secs(60)),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url = std::env::var("GUESTBOOK_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.server_url);

        let reconnect_delay = env_parse::<u64>("GUESTBOOK_RECONNECT_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_delay);

        let max_reconnect_attempts = env_parse("GUESTBOOK_MAX_RECONNECT_ATTEMPTS")
            .unwrap_or(defaults.max_reconnect_attempts);

        let toast_duration = env_parse::<u64>("GUESTBOOK_TOAST_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.toast_duration);

        let request_timeout = env_parse::<u64>("GUESTBOOK_REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        // 0 disables periodic reconciliation
        let resync_interval = match env_parse::<u64>("GUESTBOOK_RESYNC_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.resync_interval,
        };

        Self {
            server_url,
            reconnect_delay,
            max_reconnect_attempts,
            toast_duration,
            request_timeout,
            resync_interval,
        }
    }

    /// Override the server URL, normalising a trailing slash away.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.toast_duration, Duration::from_secs(5));
        assert_eq!(config.resync_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_with_server_url_strips_trailing_slash() {
        let config = SyncConfig::default().with_server_url("http://example.com:8080/");
        assert_eq!(config.server_url, "http://example.com:8080");
    }
}
