//! Named status and control points exposed by the board driver.
//!
//! Names follow the driver's GPIO table. Control writes go through the
//! helper process (`iotg_proc -f <NAME> <value>`); status reads come from
//! `/proc/iotg300/<NAME>`. No two devices share an endpoint, which is what
//! makes per-device write serialization sufficient.

use std::fmt;

use serde::Serialize;

/// A named hardware status/control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Endpoint(&'static str);

impl Endpoint {
    /// 4G modem power (LOW: off, HIGH: on).
    pub const CPU_PW_4G: Self = Self("CPU_PW_4G");
    /// BLE module power.
    pub const CPU_PW_BLE: Self = Self("CPU_PW_BLE");
    /// BLE module reset line (LOW: reset, HIGH: normal work).
    pub const CPU_RST_BLE: Self = Self("CPU_RST_BLE");
    /// Zigbee module power.
    pub const CPU_PW_ZIG: Self = Self("CPU_PW_ZIG");
    /// Zigbee module reset line.
    pub const IO_RST_ZIGBEE: Self = Self("IO_RST_ZIGBEE");
    /// Z-Wave module power.
    pub const CPU_PW_ZWAVE: Self = Self("CPU_PW_ZWAVE");
    /// Z-Wave module reset line.
    pub const CPU_RST_ZWAVE: Self = Self("CPU_RST_ZWAVE");
    /// Wi-Fi module power.
    pub const CPU_PW_WIFI: Self = Self("CPU_PW_WIFI");
    /// Speaker power.
    pub const CPU_PWR_SPK: Self = Self("CPU_PWR_SPK");
    /// Amplifier power.
    pub const CPU_AMP_PWR: Self = Self("CPU_AMP_PWR");
    /// Amplifier fault input (HIGH: I2C address error).
    pub const CPU_AMP_FAULT: Self = Self("CPU_AMP_FAULT");
    /// Battery charge state input.
    pub const CPU_BAT_STATE: Self = Self("CPU_BAT_STATE");
    /// SIM slot select (LOW: SIM2, HIGH: SIM1).
    pub const SEL_SIM: Self = Self("SEL_SIM");
    /// SIM1 card presence (HIGH: inserted).
    pub const SIM1: Self = Self("SIM1");
    /// SIM2 card presence (HIGH: inserted).
    pub const SIM2: Self = Self("SIM2");
    /// RGB status light, driven with `color R G B` / `color off`.
    pub const RGB_LED: Self = Self("RGB_LED");

    /// The endpoint name as understood by the driver.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One hardware reading a poll routine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "source", content = "endpoint", rename_all = "snake_case")]
pub enum Reading {
    /// Integer status from a named endpoint.
    Status(Endpoint),
    /// Raw battery ADC value (0..=1024).
    BatteryAdc,
    /// Battery charge in percent.
    BatteryLevel,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(endpoint) => endpoint.fmt(f),
            Self::BatteryAdc => f.write_str("battery_adc"),
            Self::BatteryLevel => f.write_str("battery_level"),
        }
    }
}
