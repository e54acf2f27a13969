//! The closed set of hardware module kinds and their endpoint wiring.

use serde::Serialize;

use crate::endpoint::{Endpoint, Reading};

pub const POWER: &str = "Power";
pub const LED: &str = "LED";
pub const SIM: &str = "SIM";
pub const SIM1: &str = "SIM1";
pub const SIM2: &str = "SIM2";
pub const MODE: &str = "Mode";
pub const COLOR: &str = "Color";

/// Name of the reset action and of the event it raises.
pub const RESET_ACTION: &str = "reset";
pub const RESET_EVENT: &str = "Reset";

/// A radio module with a power line and, for some, a reset line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioModule {
    #[serde(rename = "4g")]
    FourG,
    Ble,
    Zigbee,
    Zwave,
    Wifi,
}

impl RadioModule {
    pub const ALL: [Self; 5] = [Self::FourG, Self::Ble, Self::Zigbee, Self::Zwave, Self::Wifi];

    #[must_use]
    pub const fn power_endpoint(self) -> Endpoint {
        match self {
            Self::FourG => Endpoint::CPU_PW_4G,
            Self::Ble => Endpoint::CPU_PW_BLE,
            Self::Zigbee => Endpoint::CPU_PW_ZIG,
            Self::Zwave => Endpoint::CPU_PW_ZWAVE,
            Self::Wifi => Endpoint::CPU_PW_WIFI,
        }
    }

    #[must_use]
    pub const fn reset_endpoint(self) -> Option<Endpoint> {
        match self {
            Self::Ble => Some(Endpoint::CPU_RST_BLE),
            Self::Zigbee => Some(Endpoint::IO_RST_ZIGBEE),
            Self::Zwave => Some(Endpoint::CPU_RST_ZWAVE),
            Self::FourG | Self::Wifi => None,
        }
    }

    pub(crate) const fn id(self) -> &'static str {
        match self {
            Self::FourG => "device_4g",
            Self::Ble => "device_ble",
            Self::Zigbee => "device_zigbee",
            Self::Zwave => "device_zwave",
            Self::Wifi => "device_wifi",
        }
    }

    pub(crate) const fn title(self) -> &'static str {
        match self {
            Self::FourG => "4G Module",
            Self::Ble => "BLE Module",
            Self::Zigbee => "Zigbee Module",
            Self::Zwave => "Zwave Module",
            Self::Wifi => "Wi-Fi Module",
        }
    }

    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::FourG => "4G device information",
            Self::Ble => "BLE device information",
            Self::Zigbee => "Zigbee device information",
            Self::Zwave => "Zwave device information",
            Self::Wifi => "Wi-Fi device information",
        }
    }
}

/// Which hardware module a device drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Battery,
    Radio(RadioModule),
    Amp,
    Speaker,
    SimSelector,
    ColorLight,
}

impl DeviceKind {
    /// The endpoint a property write is sent to, if the device is controllable.
    #[must_use]
    pub const fn control_endpoint(self) -> Option<Endpoint> {
        match self {
            Self::Battery => None,
            Self::Radio(module) => Some(module.power_endpoint()),
            Self::Amp => Some(Endpoint::CPU_AMP_PWR),
            Self::Speaker => Some(Endpoint::CPU_PWR_SPK),
            Self::SimSelector => Some(Endpoint::SEL_SIM),
            Self::ColorLight => Some(Endpoint::RGB_LED),
        }
    }

    #[must_use]
    pub const fn reset_endpoint(self) -> Option<Endpoint> {
        match self {
            Self::Radio(module) => module.reset_endpoint(),
            _ => None,
        }
    }

    /// Properties made read-only while an operation is in flight.
    ///
    /// These are also the only writable properties of the device.
    #[must_use]
    pub const fn gated_properties(self) -> &'static [&'static str] {
        match self {
            Self::Battery => &[],
            Self::Radio(_) | Self::Amp | Self::Speaker => &[POWER],
            Self::SimSelector => &[SIM],
            Self::ColorLight => &[POWER, MODE, COLOR],
        }
    }

    /// Readings taken on every poll pass. Empty for non-pollable devices.
    #[must_use]
    pub fn poll_readings(self) -> Vec<Reading> {
        match self {
            Self::Battery => vec![
                Reading::BatteryAdc,
                Reading::BatteryLevel,
                Reading::Status(Endpoint::CPU_BAT_STATE),
            ],
            Self::Amp => vec![Reading::Status(Endpoint::CPU_AMP_FAULT)],
            Self::SimSelector => vec![
                Reading::Status(Endpoint::SEL_SIM),
                Reading::Status(Endpoint::SIM1),
                Reading::Status(Endpoint::SIM2),
            ],
            Self::Radio(_) | Self::Speaker | Self::ColorLight => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_pollable(self) -> bool {
        matches!(self, Self::Battery | Self::Amp | Self::SimSelector)
    }

    /// Reading taken once when the device is announced.
    #[must_use]
    pub const fn sync_reading(self) -> Option<Reading> {
        match self {
            Self::Battery | Self::ColorLight => None,
            Self::Radio(module) => Some(Reading::Status(module.power_endpoint())),
            Self::Amp => Some(Reading::Status(Endpoint::CPU_AMP_PWR)),
            Self::Speaker => Some(Reading::Status(Endpoint::CPU_PWR_SPK)),
            Self::SimSelector => Some(Reading::Status(Endpoint::SEL_SIM)),
        }
    }
}
