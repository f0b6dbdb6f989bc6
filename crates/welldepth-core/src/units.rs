//! Physical constants and the unit conversions applied at ingestion.
//!
//! Everything past ingestion works in metres of water head for levels and kilopascals for
//! atmospheric pressure.

use welldepth_parser::MeasurementUnit;

/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.80665;
/// Standard temperature lapse rate, K/m.
pub const LAPSE_RATE: f64 = 0.0065;
/// Molar mass of dry air, kg/mol.
pub const MOLAR_MASS_AIR: f64 = 0.0289644;
/// Universal gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.3144598;
/// Sea-level standard temperature, K.
pub const STANDARD_TEMPERATURE_K: f64 = 288.15;

const KPA_PER_MBAR: f64 = 0.1;
const KPA_PER_INHG: f64 = 3.38639;
const CM_PER_M: f64 = 100.0;

/// Metres of fresh water (ρ = 1000 kg/m³) equivalent to a pressure.
pub fn kpa_to_head_m(kpa: f64) -> f64 {
    kpa / GRAVITY
}

pub fn head_m_to_kpa(head_m: f64) -> f64 {
    head_m * GRAVITY
}

pub fn cm_to_m(cm: f64) -> f64 {
    cm / CM_PER_M
}

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.15
}

/// Converts a pressure-or-length reading to kilopascals.
pub fn to_kpa(value: f64, unit: MeasurementUnit) -> f64 {
    match unit {
        MeasurementUnit::KiloPascal => value,
        MeasurementUnit::Millibar => value * KPA_PER_MBAR,
        MeasurementUnit::InchesMercury => value * KPA_PER_INHG,
        MeasurementUnit::Meters => head_m_to_kpa(value),
        MeasurementUnit::Centimeters => head_m_to_kpa(cm_to_m(value)),
    }
}

/// Converts a pressure-or-length reading to metres of water head.
pub fn to_head_m(value: f64, unit: MeasurementUnit) -> f64 {
    match unit {
        MeasurementUnit::Meters => value,
        MeasurementUnit::Centimeters => cm_to_m(value),
        pressure => kpa_to_head_m(to_kpa(value, pressure)),
    }
}

/// Barometric formula: moves a pressure observed at `source_elevation_m` to `target_elevation_m`.
///
/// `P' = P·(1 − L·Δh/T)^(gM/RL)` with `Δh = target − source`. A missing air temperature
/// falls back to the standard atmosphere at the source elevation; moving from `a` to `b`
/// and back then returns the original pressure.
pub fn adjust_pressure_for_elevation(
    pressure_kpa: f64,
    source_elevation_m: f64,
    target_elevation_m: f64,
    temperature_c: Option<f64>,
) -> f64 {
    let delta_h = target_elevation_m - source_elevation_m;
    if delta_h == 0.0 {
        return pressure_kpa;
    }
    let temperature_k = temperature_c
        .map(celsius_to_kelvin)
        .unwrap_or(STANDARD_TEMPERATURE_K - LAPSE_RATE * source_elevation_m);
    let exponent = GRAVITY * MOLAR_MASS_AIR / (GAS_CONSTANT * LAPSE_RATE);
    pressure_kpa * (1.0 - LAPSE_RATE * delta_h / temperature_k).powf(exponent)
}
