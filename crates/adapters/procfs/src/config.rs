//! Procfs adapter configuration (`[hardware]` section).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Where the battery charge percentage comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryLevelSource {
    /// Read the file maintained by the power-management daemon.
    #[default]
    File,
    /// Query the power-management helper (`iotg_pm -a 3`).
    Pm,
}

/// How control writes reach the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMethod {
    /// Run `<helper> -f <NAME> <value>`.
    #[default]
    Helper,
    /// Write the value straight into `<proc_dir>/<NAME>`.
    ProcFile,
}

/// Configuration for the procfs hardware adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcfsConfig {
    /// Directory holding one status file per endpoint.
    pub proc_dir: PathBuf,
    /// Control helper invoked for writes.
    pub helper: PathBuf,
    /// Power-management helper queried for the battery level.
    pub pm_helper: PathBuf,
    /// File holding the raw battery ADC value.
    pub battery_adc_path: PathBuf,
    /// File holding the battery level in percent.
    pub battery_level_path: PathBuf,
    pub battery_level_source: BatteryLevelSource,
    pub write_method: WriteMethod,
    /// Upper bound on a single control write, in seconds. Unset waits forever.
    pub write_timeout_secs: Option<u64>,
}

impl ProcfsConfig {
    #[must_use]
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ProcfsConfig {
    fn default() -> Self {
        Self {
            proc_dir: PathBuf::from("/proc/iotg300"),
            helper: PathBuf::from("/usr/bin/iotg_proc"),
            pm_helper: PathBuf::from("/usr/bin/iotg_pm"),
            battery_adc_path: PathBuf::from("/tmp/battery_adc"),
            battery_level_path: PathBuf::from("/tmp/battery_level"),
            battery_level_source: BatteryLevelSource::File,
            write_method: WriteMethod::Helper,
            write_timeout_secs: None,
        }
    }
}
