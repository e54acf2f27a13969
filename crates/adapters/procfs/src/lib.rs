//! # iotg-adapter-procfs
//!
//! Hardware adapter: implements the `HardwareChannel` port against the
//! IoTG300 board driver.
//!
//! ## Responsibilities
//! - Read endpoint status values from `<proc_dir>/<NAME>`
//! - Read battery values from the files kept by the power-management daemon,
//!   or query `iotg_pm -a 3` for the level
//! - Issue control writes through `iotg_proc -f <NAME> <value>` (or, when
//!   configured, by writing the proc file directly)
//!
//! ## Dependency rule
//! Same as other adapters: depends on `iotg-app` and `iotg-domain`.

pub mod channel;
pub mod config;
pub mod error;

pub use channel::ProcfsChannel;
pub use config::{BatteryLevelSource, ProcfsConfig, WriteMethod};
pub use error::ProcfsError;
