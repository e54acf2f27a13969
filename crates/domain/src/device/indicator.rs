//! Values derived from raw status readings.

use crate::value::Rgb;

/// Largest raw value reported by the battery ADC.
pub const ADC_MAX: i64 = 1024;
/// Voltage corresponding to [`ADC_MAX`].
pub const FULL_SCALE_VOLTAGE: f64 = 5.0;

/// Battery voltage for a raw ADC reading: `adc * 5 / 1024`.
///
/// The reading is clamped into `0..=1024` first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn battery_voltage(adc: i64) -> f64 {
    adc.clamp(0, ADC_MAX) as f64 * FULL_SCALE_VOLTAGE / ADC_MAX as f64
}

/// LED colour for the raw `CPU_BAT_STATE` value.
#[must_use]
pub fn battery_state_color(state: i64) -> Rgb {
    match state {
        0 => Rgb::GREEN,
        1 => Rgb::ORANGE,
        2 => Rgb::RED,
        _ => Rgb::BLACK,
    }
}

/// LED colour for the raw `CPU_AMP_FAULT` value.
#[must_use]
pub fn amp_fault_color(fault: i64) -> Rgb {
    match fault {
        0 => Rgb::GREEN,
        1 => Rgb::RED,
        _ => Rgb::BLACK,
    }
}
