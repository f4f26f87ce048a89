// crates/containership/src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::time::Duration;
use tracing::{debug, warn};

/// Service base URL (CONTAINERSHIP_API_URL)
pub const API_URL_VAR: &str = "CONTAINERSHIP_API_URL";
/// Whole-request timeout in seconds (CONTAINERSHIP_TIMEOUT_SECS)
pub const TIMEOUT_VAR: &str = "CONTAINERSHIP_TIMEOUT_SECS";
/// Connect timeout in seconds (CONTAINERSHIP_CONNECT_TIMEOUT_SECS)
pub const CONNECT_TIMEOUT_VAR: &str = "CONTAINERSHIP_CONNECT_TIMEOUT_SECS";
/// Log level filter (CONTAINERSHIP_LOG)
pub const LOG_VAR: &str = "CONTAINERSHIP_LOG";

/// Values read from the process environment; unset means "use the next layer"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_url: Option<String>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            api_url: read(API_URL_VAR),
            request_timeout: read(TIMEOUT_VAR).and_then(|v| parse_secs(TIMEOUT_VAR, &v)),
            connect_timeout: read(CONNECT_TIMEOUT_VAR).and_then(|v| parse_secs(CONNECT_TIMEOUT_VAR, &v)),
            log_level: read(LOG_VAR),
        };

        if let Some(url) = &config.api_url {
            debug!(url = %url, "Analysis service URL from environment");
        }
        config
    }
}

fn parse_secs(name: &str, value: &str) -> Option<Duration> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(var = name, value, "Invalid timeout, using default");
            None
        }
    }
}
