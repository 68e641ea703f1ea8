//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for structured JSON logs, anything else for text
/// - `EXPIRY_SWEEP_INTERVAL_SECS`: seconds between promotion expiry sweeps (default: `3600`)
/// - `TOKEN_TTL_SECS`: access token lifetime in seconds (default: `900`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub expiry_sweep_interval: Duration,
    pub token_ttl: Duration,
}

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT").unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            expiry_sweep_interval: Duration::from_secs(
                env_parsed("EXPIRY_SWEEP_INTERVAL_SECS")
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
            token_ttl: Duration::from_secs(
                env_parsed("TOKEN_TTL_SECS")
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            expiry_sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}
