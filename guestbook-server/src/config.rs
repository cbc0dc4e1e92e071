//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;

use guestbook_core::compress::MAX_DIMENSION;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 5)
    pub body_limit_mb: usize,
    /// Maximum decoded image size in KB (default: 1024)
    pub max_image_bytes_kb: usize,
    /// Maximum longer side of an uploaded image in pixels (default: 800)
    pub max_image_dimension: u32,
    /// Request timeout in seconds, not applied to the push stream (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Push events buffered per subscriber before it starts lagging (default: 64)
    pub event_buffer: usize,
    /// Interval of keep-alive comments on the push stream in seconds (default: 15)
    pub stream_keepalive_secs: u64,
    /// Longest accepted visitor name, in characters (default: 50)
    pub max_name_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 5,
            max_image_bytes_kb: 1024,
            max_image_dimension: MAX_DIMENSION,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            event_buffer: 64,
            stream_keepalive_secs: 15,
            max_name_chars: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            max_image_bytes_kb: env_parse("MAX_IMAGE_BYTES_KB")
                .unwrap_or(defaults.max_image_bytes_kb),
            max_image_dimension: env_parse("MAX_IMAGE_DIMENSION")
                .unwrap_or(defaults.max_image_dimension),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            event_buffer: env_parse("EVENT_BUFFER").unwrap_or(defaults.event_buffer),
            stream_keepalive_secs: env_parse("STREAM_KEEPALIVE_SECS")
                .unwrap_or(defaults.stream_keepalive_secs),
            max_name_chars: env_parse("MAX_NAME_CHARS").unwrap_or(defaults.max_name_chars),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum decoded image size in bytes
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes_kb * 1024
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
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.max_image_dimension, 800);
        assert_eq!(config.max_image_bytes(), 1024 * 1024);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
    }
}
