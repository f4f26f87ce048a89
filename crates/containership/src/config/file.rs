// crates/containership/src/config/file.rs
// File-based configuration from ~/.containership/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ContainershipConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Analysis service section
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    /// Combined stream endpoint path
    pub stream_path: Option<String>,
    /// One-shot batch endpoint path
    pub batch_path: Option<String>,
    /// Per-clause endpoint path
    pub item_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Upload section
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct UploadConfig {
    /// File name an upload must carry
    pub expected_name: Option<String>,
}

impl ContainershipConfig {
    /// Load config from ~/.containership/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path; missing or malformed files yield defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".containership")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[service]
base_url = "https://ship.example.com"
stream_path = "/v2/analyze/stream"
timeout_secs = 90

[upload]
expected_name = "Containerfile"
"#;
        let config: ContainershipConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.service.base_url.as_deref(), Some("https://ship.example.com"));
        assert_eq!(config.service.stream_path.as_deref(), Some("/v2/analyze/stream"));
        assert_eq!(config.service.batch_path, None);
        assert_eq!(config.service.timeout_secs, Some(90));
        assert_eq!(config.upload.expected_name.as_deref(), Some("Containerfile"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ContainershipConfig = toml::from_str("").unwrap();
        assert_eq!(config, ContainershipConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContainershipConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, ContainershipConfig::default());
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service\nbase_url = ").unwrap();
        let config = ContainershipConfig::load_from(file.path());
        assert_eq!(config, ContainershipConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nbase_url = \"http://10.0.0.2:8000\"").unwrap();
        let config = ContainershipConfig::load_from(file.path());
        assert_eq!(config.service.base_url.as_deref(), Some("http://10.0.0.2:8000"));
    }
}
