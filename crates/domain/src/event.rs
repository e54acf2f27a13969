//! Notifications pushed from devices to the framework boundary.
//!
//! Every property value change, read-only flag change, named device event
//! and announcement/removal is delivered as a [`Notification`].

use serde::Serialize;

use crate::device::DeviceSnapshot;
use crate::id::{DeviceId, EventId};
use crate::time::{Timestamp, local_display, now};
use crate::value::Value;

/// Something the framework must be told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A device was (re-)announced to the framework.
    DeviceAdded { device: Box<DeviceSnapshot> },
    /// A device was detached from the externally visible set.
    DeviceRemoved { device_id: DeviceId },
    /// A property took a new value.
    PropertyChanged {
        device_id: DeviceId,
        property: String,
        value: Value,
    },
    /// A property became writable or read-only.
    ReadOnlyChanged {
        device_id: DeviceId,
        property: String,
        read_only: bool,
    },
    /// A named device event (e.g. `Reset`).
    Event(DeviceEvent),
}

impl Notification {
    /// The device this notification concerns.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceAdded { device } => &device.id,
            Self::DeviceRemoved { device_id }
            | Self::PropertyChanged { device_id, .. }
            | Self::ReadOnlyChanged { device_id, .. } => device_id,
            Self::Event(event) => &event.device_id,
        }
    }
}

/// An immutable record of a named device event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEvent {
    pub id: EventId,
    pub device_id: DeviceId,
    pub name: String,
    pub description: String,
    pub timestamp: Timestamp,
}

impl DeviceEvent {
    /// Create an event stamped with the current time.
    ///
    /// Without a description the local-time rendering of the timestamp is
    /// used instead.
    #[must_use]
    pub fn new(device_id: DeviceId, name: impl Into<String>, description: Option<String>) -> Self {
        let timestamp = now();
        Self {
            id: EventId::new(),
            device_id,
            name: name.into(),
            description: description.unwrap_or_else(|| local_display(timestamp)),
            timestamp,
        }
    }
}
