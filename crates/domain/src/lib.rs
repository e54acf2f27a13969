//! # iotg-domain
//!
//! Pure domain model for the gateway's onboard hardware bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Values** and the domains properties declare for them
//! - Define **Properties** (named, typed values with a read-only flag)
//! - Define **Endpoints** (named status/control points of the board driver)
//! - Define **Devices** (one per onboard module) and their write-serialization
//!   state machine
//! - Define **Notifications** (value changes, flag changes, device events)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! Devices return [`device::Effect`]s; executing them is the job of the `app`
//! crate and its ports.

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod endpoint;
pub mod event;
pub mod property;
pub mod value;
