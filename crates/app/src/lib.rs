//! # iotg-app
//!
//! Application layer: the adapter runtime and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `HardwareChannel`: status reads and control writes against the board
//!   - `ThingPublisher`: delivery of notifications to the framework
//! - Provide **in-process infrastructure** (notification bus, polling
//!   scheduler) that doesn't need IO
//! - Run the **adapter**: one task owning every device, executing the
//!   effects their state machines request and routing completions back
//!
//! ## Dependency rule
//! Depends on `iotg-domain` only (plus `tokio` for channels, tasks and
//! timers). Never imports adapter crates.

pub mod adapter;
pub mod event_bus;
pub mod ports;
pub mod scheduler;
