// crates/containership/src/config/mod.rs
// Configuration and shared constants

pub mod env;
pub mod file;

pub use env::EnvConfig;
pub use file::ContainershipConfig;

use crate::error::Result;
use crate::http::{CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_STREAM_PATH: &str = "/analyze/stream/";
pub const DEFAULT_BATCH_PATH: &str = "/upload/";
pub const DEFAULT_ITEM_PATH: &str = "/analyze/clause/";

/// The only file name an upload may carry
pub const EXPECTED_FILE_NAME: &str = "Dockerfile";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolved settings: environment over config file over built-in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Validated at construction
    pub base_url: String,
    pub stream_path: String,
    pub batch_path: String,
    pub item_path: String,
    pub expected_file_name: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub log_level: String,
}

impl Settings {
    /// Read the config file and the environment, then merge
    pub fn load() -> Result<Self> {
        Self::resolve(&ContainershipConfig::load(), &EnvConfig::from_env())
    }

    pub fn resolve(file: &ContainershipConfig, env: &EnvConfig) -> Result<Self> {
        let base_url = env
            .api_url
            .as_deref()
            .or(file.service.base_url.as_deref())
            .unwrap_or(DEFAULT_API_URL);

        let request_timeout = env
            .request_timeout
            .or(file.service.timeout_secs.filter(|&s| s > 0).map(Duration::from_secs))
            .unwrap_or(DEFAULT_TIMEOUT);

        Url::parse(base_url)?;

        Ok(Self {
            base_url: base_url.to_string(),
            stream_path: pick(&file.service.stream_path, DEFAULT_STREAM_PATH),
            batch_path: pick(&file.service.batch_path, DEFAULT_BATCH_PATH),
            item_path: pick(&file.service.item_path, DEFAULT_ITEM_PATH),
            expected_file_name: pick(&file.upload.expected_name, EXPECTED_FILE_NAME),
            request_timeout,
            connect_timeout: env.connect_timeout.unwrap_or(CONNECT_TIMEOUT),
            log_level: env.log_level.clone().unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Replace the service base URL (e.g. from a CLI flag)
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        Url::parse(url)?;
        self.base_url = url.to_string();
        Ok(self)
    }

    /// Resolve an endpoint path relative to the base URL, keeping any base path
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    pub fn stream_url(&self) -> Result<Url> {
        self.endpoint(&self.stream_path)
    }

    pub fn batch_url(&self) -> Result<Url> {
        self.endpoint(&self.batch_path)
    }

    pub fn item_url(&self) -> Result<Url> {
        self.endpoint(&self.item_path)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            batch_path: DEFAULT_BATCH_PATH.to_string(),
            item_path: DEFAULT_ITEM_PATH.to_string(),
            expected_file_name: EXPECTED_FILE_NAME.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

fn pick(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}
