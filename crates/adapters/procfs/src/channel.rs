//! [`HardwareChannel`] implementation backed by procfs files and helper
//! processes.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use iotg_app::ports::HardwareChannel;
use iotg_domain::endpoint::{Endpoint, Reading};
use iotg_domain::error::GatewayError;

use crate::config::{BatteryLevelSource, ProcfsConfig, WriteMethod};
use crate::error::ProcfsError;

/// Argument asking `iotg_pm` for the battery level.
const PM_LEVEL_ARGS: [&str; 2] = ["-a", "3"];

/// Stateless access to the board through procfs and helper processes.
#[derive(Debug, Clone)]
pub struct ProcfsChannel {
    config: ProcfsConfig,
}

impl ProcfsChannel {
    #[must_use]
    pub fn new(config: ProcfsConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ProcfsConfig {
        &self.config
    }

    fn status_path(&self, endpoint: Endpoint) -> PathBuf {
        self.config.proc_dir.join(endpoint.name())
    }

    async fn read_reading(&self, reading: Reading) -> Result<i64, ProcfsError> {
        match reading {
            Reading::Status(endpoint) => read_integer(&self.status_path(endpoint)).await,
            Reading::BatteryAdc => read_integer(&self.config.battery_adc_path).await,
            Reading::BatteryLevel => match self.config.battery_level_source {
                BatteryLevelSource::File => read_integer(&self.config.battery_level_path).await,
                BatteryLevelSource::Pm => {
                    let stdout = run(&self.config.pm_helper, &PM_LEVEL_ARGS).await?;
                    parse_integer(&stdout, &self.config.pm_helper.display().to_string())
                }
            },
        }
    }

    async fn write_endpoint(&self, endpoint: Endpoint, value: &str) -> Result<(), ProcfsError> {
        match self.config.write_method {
            WriteMethod::Helper => {
                run(&self.config.helper, &helper_args(endpoint, value)).await?;
                Ok(())
            }
            WriteMethod::ProcFile => {
                let path = self.status_path(endpoint);
                tokio::fs::write(&path, value)
                    .await
                    .map_err(|source| ProcfsError::Write { path, source })
            }
        }
    }
}

impl HardwareChannel for ProcfsChannel {
    async fn read(&self, reading: Reading) -> Result<i64, GatewayError> {
        Ok(self.read_reading(reading).await?)
    }

    async fn write(&self, endpoint: Endpoint, value: &str) -> Result<(), GatewayError> {
        tracing::debug!(%endpoint, value, "control write");
        Ok(self.write_endpoint(endpoint, value).await?)
    }
}

/// Arguments for the control helper: `-f <NAME>` followed by the
/// whitespace-separated words of the value.
#[must_use]
pub fn helper_args(endpoint: Endpoint, value: &str) -> Vec<&str> {
    let mut args = vec!["-f", endpoint.name()];
    args.extend(value.split_whitespace());
    args
}

/// Parse the leading decimal integer of `raw`, ignoring trailing text.
///
/// # Errors
///
/// Returns [`ProcfsError::NotAnInteger`] when `raw` does not start with an
/// integer.
pub fn parse_integer(raw: &str, origin: &str) -> Result<i64, ProcfsError> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    trimmed[..sign_len + digits]
        .parse()
        .map_err(|_| ProcfsError::NotAnInteger {
            origin: origin.to_string(),
            raw: raw.to_string(),
        })
}

async fn read_integer(path: &Path) -> Result<i64, ProcfsError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProcfsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_integer(&raw, &path.display().to_string())
}

async fn run(program: &Path, args: &[&str]) -> Result<String, ProcfsError> {
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProcfsError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;
    if !output.status.success() {
        return Err(ProcfsError::Helper {
            program: program.to_path_buf(),
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
