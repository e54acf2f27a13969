//! Configuration loading: TOML file with environment variable overrides.
//!
//! Reads `iotgd.toml` from the working directory, or the file named by
//! `IOTGD_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::Path;
use std::time::Duration;

use iotg_adapter_procfs::ProcfsConfig;
use iotg_app::adapter::{AdapterConfig, DEFAULT_POLL_INTERVAL};
use serde::Deserialize;

const DEFAULT_PATH: &str = "iotgd.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub polling: PollingConfig,
    /// Board driver paths and write settings.
    pub hardware: ProcfsConfig,
    pub logging: LoggingConfig,
}

/// Periodic status refresh.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between two poll passes.
    pub interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load the configuration file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("IOTGD_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("IOTGD_POLL_INTERVAL") {
            self.polling.interval_secs = val.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("IOTGD_POLL_INTERVAL is not a number: {val}"))
            })?;
        }
        if let Some(val) = lookup("IOTGD_PROC_DIR") {
            self.hardware.proc_dir = val.into();
        }
        if let Some(val) = lookup("IOTGD_HELPER") {
            self.hardware.helper = val.into();
        }
        if let Some(val) = lookup("IOTGD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "polling interval must be non-zero".to_string(),
            ));
        }
        if self.hardware.write_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "write timeout must be non-zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the device adapter.
    #[must_use]
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            poll_interval: Duration::from_secs(self.polling.interval_secs),
            write_timeout: self.hardware.write_timeout(),
            ..AdapterConfig::default()
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "iotgd=info,iotg_app=info,iotg_adapter_procfs=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
