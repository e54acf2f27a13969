//! Devices and their write-serialization state machine.
//!
//! A [`Device`] is a sans-IO state machine. Framework requests
//! ([`Device::handle_property_change`], [`Device::handle_action`]) and IO
//! completions ([`Device::on_completion`]) mutate it and return the
//! [`Effect`]s the runtime must carry out. At most one hardware operation is
//! in flight per device:
//!
//! ```text
//!            write                      WriteDone
//!   Idle ─────────────▶ Writing ───────────────────▶ Idle
//!    │
//!    │ reset         WriteDone(0)             Woke → write 1     WriteDone(1)
//!    └──────▶ ResetStep1 ─────▶ ResetStep2 ─────────────────▶ ResetStep2 ─────▶ Idle
//! ```
//!
//! Requests arriving outside `Idle` are dropped, never queued.

mod catalogue;
mod effect;
mod indicator;
mod kind;
mod light;
mod write_state;

use serde::Serialize;

pub use catalogue::all_devices;
pub use effect::{Completion, Effect};
pub use indicator::{
    ADC_MAX, FULL_SCALE_VOLTAGE, amp_fault_color, battery_state_color, battery_voltage,
};
pub use kind::{DeviceKind, RESET_ACTION, RESET_EVENT, RadioModule};
pub use light::{MODE_COLOR, MODE_OFF, led_command};
pub use write_state::{RESET_DELAY, WriteState};

use crate::endpoint::{Endpoint, Reading};
use crate::error::Rejection;
use crate::event::{DeviceEvent, Notification};
use crate::id::DeviceId;
use crate::property::{Properties, PropertyState};
use crate::value::Value;

/// Outcome of a framework request addressed to a device.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The request was accepted; the runtime must execute these effects.
    Started(Vec<Effect>),
    /// The device was busy in the given state and dropped the request.
    Ignored(WriteState),
}

/// One onboard hardware module exposed to the framework.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    properties: Properties,
    write_state: WriteState,
}

impl Device {
    /// Create a device of the given kind in its initial state.
    #[must_use]
    pub fn new(kind: DeviceKind) -> Self {
        let id = DeviceId::from(catalogue::device_id(kind));
        Self {
            properties: catalogue::properties(kind, &id),
            id,
            kind,
            write_state: WriteState::Idle,
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    #[must_use]
    pub fn write_state(&self) -> WriteState {
        self.write_state
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub fn is_pollable(&self) -> bool {
        self.kind.is_pollable()
    }

    /// Handle a property write requested by the framework.
    ///
    /// On acceptance the property takes the new value, the device's control
    /// properties are gated read-only and a control write is issued.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when the property does not exist, is
    /// read-only, or the value is outside its domain.
    pub fn handle_property_change(
        &mut self,
        name: &str,
        value: Value,
    ) -> Result<Dispatch, Rejection> {
        let Some(property) = self.properties.get(name) else {
            return Err(Rejection::UnknownProperty(name.to_string()));
        };
        let gated = self.kind.gated_properties().contains(&name);
        let Some(endpoint) = self.kind.control_endpoint() else {
            return Err(Rejection::ReadOnly(name.to_string()));
        };
        // permanently read-only, whatever the write state
        if property.is_read_only() && !gated {
            return Err(Rejection::ReadOnly(name.to_string()));
        }
        if !self.write_state.is_idle() {
            return Ok(Dispatch::Ignored(self.write_state));
        }

        let mut out = Vec::new();
        let accepted = self
            .properties
            .get_mut(name)
            .ok_or_else(|| Rejection::UnknownProperty(name.to_string()))?
            .write(value, &mut out)?;
        let command = self.control_command(&accepted);
        self.set_gate(true, &mut out);
        self.write_state = WriteState::Writing;
        out.push(Effect::Write {
            endpoint,
            value: command,
        });
        Ok(Dispatch::Started(out))
    }

    /// Handle an action invocation requested by the framework.
    ///
    /// `reset` raises a `Reset` event, gates the power property and pulses
    /// the reset line low for [`RESET_DELAY`].
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownAction`] when the device declares no such
    /// action.
    pub fn handle_action(&mut self, name: &str) -> Result<Dispatch, Rejection> {
        let endpoint = match self.kind.reset_endpoint() {
            Some(endpoint) if name == RESET_ACTION => endpoint,
            _ => return Err(Rejection::UnknownAction(name.to_string())),
        };
        if !self.write_state.is_idle() {
            return Ok(Dispatch::Ignored(self.write_state));
        }

        let mut out = vec![Effect::Notify(Notification::Event(DeviceEvent::new(
            self.id.clone(),
            RESET_EVENT,
            None,
        )))];
        self.set_gate(true, &mut out);
        self.write_state = WriteState::ResetStep1;
        out.push(Effect::Write {
            endpoint,
            value: "0".to_string(),
        });
        Ok(Dispatch::Started(out))
    }

    /// Feed the outcome of an earlier effect back into the state machine.
    ///
    /// Completions that do not fit the current state are discarded.
    pub fn on_completion(&mut self, completion: Completion) -> Vec<Effect> {
        let mut out = Vec::new();
        match (self.write_state, completion) {
            (_, Completion::Sampled(readings)) => {
                for (reading, raw) in readings {
                    self.apply_sample(reading, raw, &mut out);
                }
            }
            (WriteState::Writing | WriteState::ResetStep2, Completion::WriteDone { .. }) => {
                self.set_gate(false, &mut out);
                self.write_state = WriteState::Idle;
            }
            (WriteState::ResetStep1, Completion::WriteDone { .. }) => {
                self.write_state = WriteState::ResetStep2;
                out.push(Effect::Wake { after: RESET_DELAY });
            }
            (WriteState::ResetStep2, Completion::Woke) => {
                if let Some(endpoint) = self.kind.reset_endpoint() {
                    out.push(Effect::Write {
                        endpoint,
                        value: "1".to_string(),
                    });
                }
            }
            _ => {}
        }
        out
    }

    /// Readings for one poll pass, if the device is pollable.
    #[must_use]
    pub fn poll(&self) -> Option<Effect> {
        let readings = self.kind.poll_readings();
        (!readings.is_empty()).then_some(Effect::Sample { readings })
    }

    /// One-off read of the control endpoint, issued when the device is
    /// announced.
    #[must_use]
    pub fn refresh(&self) -> Option<Effect> {
        self.kind.sync_reading().map(|reading| Effect::Sample {
            readings: vec![reading],
        })
    }

    /// Announcement of this device to the framework.
    #[must_use]
    pub fn announce(&self) -> Effect {
        Effect::Notify(Notification::DeviceAdded {
            device: Box::new(self.snapshot()),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id.clone(),
            title: catalogue::title(self.kind),
            description: catalogue::description(self.kind),
            schema: catalogue::schema(self.kind).to_vec(),
            kind: self.kind,
            write_state: self.write_state,
            properties: self.properties.iter().cloned().collect(),
            actions: self
                .kind
                .reset_endpoint()
                .map(|_| ActionDescription {
                    name: RESET_ACTION,
                    title: "Reset",
                    description: "Pulse the module's reset line",
                })
                .into_iter()
                .collect(),
            events: self
                .kind
                .reset_endpoint()
                .map(|_| EventDescription {
                    name: RESET_EVENT,
                    semantic_type: "AlarmEvent",
                    value_type: "string",
                })
                .into_iter()
                .collect(),
        }
    }

    fn control_command(&self, accepted: &Value) -> String {
        match self.kind {
            DeviceKind::ColorLight => led_command(
                self.bool_value(kind::POWER),
                self.properties
                    .value(kind::MODE)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
                self.properties
                    .value(kind::COLOR)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            ),
            DeviceKind::SimSelector => level(accepted.as_str() == Some(kind::SIM1)),
            _ => level(accepted.as_bool().unwrap_or(false)),
        }
    }

    fn bool_value(&self, name: &str) -> bool {
        self.properties
            .value(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn set_gate(&mut self, read_only: bool, out: &mut Vec<Effect>) {
        for name in self.kind.gated_properties() {
            if let Some(property) = self.properties.get_mut(name) {
                property.set_read_only(read_only, out);
            }
        }
    }

    fn apply_sample(&mut self, reading: Reading, raw: i64, out: &mut Vec<Effect>) {
        match (self.kind, reading) {
            (DeviceKind::Battery, Reading::BatteryAdc) => {
                self.push("ADC", Value::Int(raw), out);
                self.push("Voltage", Value::Number(battery_voltage(raw)), out);
            }
            (DeviceKind::Battery, Reading::BatteryLevel) => {
                self.push("Level", Value::Int(raw), out);
            }
            (DeviceKind::Battery, Reading::Status(Endpoint::CPU_BAT_STATE)) => {
                self.push("State", Value::Int(raw), out);
                self.push(kind::LED, battery_state_color(raw).to_string().into(), out);
            }
            (DeviceKind::Amp, Reading::Status(Endpoint::CPU_AMP_FAULT)) => {
                self.push(kind::LED, amp_fault_color(raw).to_string().into(), out);
            }
            (DeviceKind::SimSelector, Reading::Status(Endpoint::SEL_SIM)) => {
                let slot = if raw == 0 { kind::SIM2 } else { kind::SIM1 };
                self.push(kind::SIM, slot.into(), out);
            }
            (DeviceKind::SimSelector, Reading::Status(Endpoint::SIM1)) => {
                self.push(kind::SIM1, Value::Bool(raw != 0), out);
            }
            (DeviceKind::SimSelector, Reading::Status(Endpoint::SIM2)) => {
                self.push(kind::SIM2, Value::Bool(raw != 0), out);
            }
            (_, Reading::Status(endpoint)) if self.kind.control_endpoint() == Some(endpoint) => {
                self.push(kind::POWER, Value::Bool(raw != 0), out);
            }
            _ => {}
        }
    }

    /// Push a sampled value unless the property is gated by an in-flight
    /// operation.
    fn push(&mut self, name: &str, value: Value, out: &mut Vec<Effect>) {
        if !self.write_state.is_idle() && self.kind.gated_properties().contains(&name) {
            return;
        }
        if let Some(property) = self.properties.get_mut(name) {
            let applied = property.set_value(value, out);
            debug_assert!(applied.is_ok(), "sample for {name} does not fit: {applied:?}");
        }
    }
}

fn level(high: bool) -> String {
    String::from(if high { "1" } else { "0" })
}

/// Serializable view of a device, as announced to the framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub title: &'static str,
    pub description: &'static str,
    #[serde(rename = "@type")]
    pub schema: Vec<&'static str>,
    pub kind: DeviceKind,
    pub write_state: WriteState,
    pub properties: Vec<PropertyState>,
    pub actions: Vec<ActionDescription>,
    pub events: Vec<EventDescription>,
}

impl DeviceSnapshot {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyState> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescription {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDescription {
    pub name: &'static str,
    #[serde(rename = "@type")]
    pub semantic_type: &'static str,
    #[serde(rename = "type")]
    pub value_type: &'static str,
}
