//! The fixed set of onboard modules and the properties each one exposes.

use super::Device;
use super::kind::{COLOR, DeviceKind, LED, MODE, POWER, RadioModule, SIM, SIM1, SIM2};
use super::light::{MODE_COLOR, MODE_OFF};
use crate::id::DeviceId;
use crate::property::{PropertyState, Properties};
use crate::value::ValueType;

/// Every device on the board, in announcement order.
#[must_use]
pub fn all_devices() -> Vec<Device> {
    catalogue_kinds().into_iter().map(Device::new).collect()
}

/// Build a fresh device for a catalogue id.
#[cfg(test)]
pub(crate) fn build(id: &DeviceId) -> Option<Device> {
    catalogue_kinds()
        .into_iter()
        .find(|kind| device_id(*kind) == id.as_str())
        .map(Device::new)
}

fn catalogue_kinds() -> Vec<DeviceKind> {
    let mut kinds = vec![DeviceKind::Battery];
    kinds.extend(RadioModule::ALL.map(DeviceKind::Radio));
    kinds.extend([
        DeviceKind::Speaker,
        DeviceKind::Amp,
        DeviceKind::SimSelector,
        DeviceKind::ColorLight,
    ]);
    kinds
}

pub(super) fn device_id(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Battery => "battery",
        DeviceKind::Radio(module) => module.id(),
        DeviceKind::Speaker => "device_speaker",
        DeviceKind::Amp => "device_amp",
        DeviceKind::SimSelector => "device_sim",
        DeviceKind::ColorLight => "device_led",
    }
}

pub(super) fn title(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Battery => "Battery",
        DeviceKind::Radio(module) => module.title(),
        DeviceKind::Speaker => "Speaker",
        DeviceKind::Amp => "AMP",
        DeviceKind::SimSelector => "SIM Selector",
        DeviceKind::ColorLight => "Status Light",
    }
}

pub(super) fn description(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Battery => "Battery information",
        DeviceKind::Radio(module) => module.description(),
        DeviceKind::Speaker => "Speaker device information",
        DeviceKind::Amp => "AMP device information",
        DeviceKind::SimSelector => "SIM slot selection and card presence",
        DeviceKind::ColorLight => "RGB status light",
    }
}

pub(super) fn schema(kind: DeviceKind) -> &'static [&'static str] {
    match kind {
        DeviceKind::Battery => &["MultiLevelSensor", "ColorControl"],
        DeviceKind::Radio(_) | DeviceKind::Speaker | DeviceKind::Amp => &["OnOffSwitch"],
        DeviceKind::SimSelector => &["BinarySensor"],
        DeviceKind::ColorLight => &["Light", "OnOffSwitch", "ColorControl"],
    }
}

pub(super) fn properties(kind: DeviceKind, owner: &DeviceId) -> Properties {
    let mut props = Properties::default();
    match kind {
        DeviceKind::Battery => {
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    "ADC",
                    ValueType::Integer {
                        minimum: 0,
                        maximum: 1024,
                    },
                )
                .description("The battery ADC")
                .read_only()
                .build(),
            );
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    "Level",
                    ValueType::Integer {
                        minimum: 0,
                        maximum: 100,
                    },
                )
                .semantic_type("LevelProperty")
                .unit("%")
                .description("The battery level in percent")
                .read_only()
                .build(),
            );
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    "Voltage",
                    ValueType::Number {
                        minimum: 0.0,
                        maximum: 5.0,
                    },
                )
                .unit("volt")
                .description("The battery voltage")
                .read_only()
                .build(),
            );
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    "State",
                    ValueType::Integer {
                        minimum: 0,
                        maximum: 2,
                    },
                )
                .description("The battery state")
                .read_only()
                .build(),
            );
            props.insert(indicator(owner, "The battery LED"));
        }
        DeviceKind::Radio(_) | DeviceKind::Speaker => props.insert(power(owner)),
        DeviceKind::Amp => {
            props.insert(power(owner));
            props.insert(indicator(owner, "The AMP LED"));
        }
        DeviceKind::SimSelector => {
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    SIM,
                    ValueType::Enumeration {
                        values: vec![SIM1, SIM2],
                    },
                )
                .title("Active SIM")
                .description("The selected SIM slot")
                .build(),
            );
            props.insert(presence(owner, SIM1));
            props.insert(presence(owner, SIM2));
        }
        DeviceKind::ColorLight => {
            props.insert(power(owner));
            props.insert(
                PropertyState::builder(
                    owner.clone(),
                    MODE,
                    ValueType::Enumeration {
                        values: vec![MODE_OFF, MODE_COLOR],
                    },
                )
                .title("Mode")
                .description("Light mode")
                .build(),
            );
            props.insert(
                PropertyState::builder(owner.clone(), COLOR, ValueType::Color)
                    .semantic_type("ColorProperty")
                    .description("The light colour")
                    .build(),
            );
        }
    }
    props
}

fn power(owner: &DeviceId) -> PropertyState {
    PropertyState::builder(owner.clone(), POWER, ValueType::Boolean)
        .semantic_type("OnOffProperty")
        .title("On/Off")
        .value(false)
        .build()
}

fn indicator(owner: &DeviceId, description: &str) -> PropertyState {
    PropertyState::builder(owner.clone(), LED, ValueType::Color)
        .semantic_type("ColorProperty")
        .description(description)
        .read_only()
        .build()
}

fn presence(owner: &DeviceId, slot: &'static str) -> PropertyState {
    PropertyState::builder(owner.clone(), slot, ValueType::Boolean)
        .semantic_type("BooleanProperty")
        .description(format!("{slot} card inserted"))
        .read_only()
        .build()
}
