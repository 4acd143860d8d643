//! Daemon configuration.

use anyhow::{Context, Result};
use clap::ValueEnum;
use fleetscope_nats::NatsConfig;
use fleetscope_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fleetscope.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Daemon configuration, loaded from YAML and overridden by flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Comma-separated NATS server URLs.
    pub nats_urls: String,
    pub client_name: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats_urls: "nats://127.0.0.1:4222".to_string(),
            client_name: "fleetscope".to_string(),
            port: 8080,
            static_dir: None,
            log_format: LogFormat::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// Flag values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub nats_urls: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Load from an explicit path, or from the default file if present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(urls) = overrides.nats_urls {
            self.nats_urls = urls;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.static_dir {
            self.static_dir = Some(dir);
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
    }

    pub fn nats_config(&self) -> NatsConfig {
        NatsConfig::from_url_list(&self.nats_urls).with_name(self.client_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.nats_urls, "nats://127.0.0.1:4222");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.sync.refresh_interval_secs, 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
port: 9090
sync:
  refresh_interval_secs: 30
  subjects:
    heartbeat: custom.heartbeat
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.nats_urls, "nats://127.0.0.1:4222");
        assert_eq!(config.sync.refresh_interval_secs, 30);
        assert_eq!(config.sync.request_timeout_ms, 1000);
        assert_eq!(config.sync.subjects.heartbeat, "custom.heartbeat");
        assert_eq!(config.sync.subjects.advertise, "agent.advertise");
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = AppConfig::from_yaml("port: 9090\nlog_format: json\n").unwrap();
        config.apply(Overrides {
            nats_urls: Some("nats://a:4222,nats://b:4222".to_string()),
            port: Some(7000),
            ..Default::default()
        });

        assert_eq!(config.port, 7000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.nats_config().urls,
            vec!["nats://a:4222".to_string(), "nats://b:4222".to_string()]
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/fleetscope.yaml"))).is_err());
    }
}
