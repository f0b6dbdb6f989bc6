//! Adapters from parsed files to core types. Unit conversion happens here and nowhere else.

use std::collections::HashMap;

use welldepth_parser::{
    FieldNoteRow, ManualTable, MeasurementUnit, ParsedLoggerFile, WellElevation,
};

use crate::config::DepthUnit;
use crate::edge_trimmer::FieldWindow;
use crate::types::{BaroSource, BarometricSample, ManualMeasurement, SensorSample};
use crate::units::{cm_to_m, to_head_m, to_kpa};

/// One logger export belonging to one well.
#[derive(Debug, Clone)]
pub struct SensorFile {
    pub label: String,
    pub well_id: String,
    pub samples: Vec<SensorSample>,
}

impl SensorFile {
    pub fn from_parsed(label: impl Into<String>, well_id: &str, parsed: &ParsedLoggerFile) -> Self {
        let unit = parsed.header.value_unit;
        let samples = parsed
            .readings
            .iter()
            .map(|reading| SensorSample {
                well_id: well_id.to_string(),
                timestamp: reading.timestamp,
                level_m: to_head_m(reading.value, unit),
                temperature: reading.temperature,
            })
            .collect();
        Self {
            label: label.into(),
            well_id: well_id.to_string(),
            samples,
        }
    }
}

pub fn barometric_samples(
    parsed: &ParsedLoggerFile,
    source: BaroSource,
    elevation_m: f64,
) -> Vec<BarometricSample> {
    let unit = parsed.header.value_unit;
    parsed
        .readings
        .iter()
        .map(|reading| BarometricSample {
            timestamp: reading.timestamp,
            pressure_kpa: to_kpa(reading.value, unit),
            temperature: reading.temperature,
            source,
            elevation_m,
        })
        .collect()
}

pub fn field_windows(rows: Vec<FieldNoteRow>) -> Vec<FieldWindow> {
    rows.into_iter()
        .map(|row| FieldWindow {
            well_id: row.well_id,
            start: row.start,
            end: row.end,
            temp_threshold: row.temp_threshold,
        })
        .collect()
}

/// The depth column's own unit wins over the configured default.
pub fn manual_measurements(table: ManualTable, default_unit: DepthUnit) -> Vec<ManualMeasurement> {
    let in_cm = match table.unit_hint {
        Some(MeasurementUnit::Centimeters) => true,
        Some(_) => false,
        None => default_unit == DepthUnit::Cm,
    };
    table
        .rows
        .into_iter()
        .map(|row| ManualMeasurement {
            well_id: row.well_id,
            timestamp: row.timestamp,
            ground_to_water_m: row
                .ground_to_water
                .map(|value| if in_cm { cm_to_m(value) } else { value }),
            water_present: row.water_present,
        })
        .collect()
}

pub fn elevation_map(wells: Vec<WellElevation>) -> HashMap<String, f64> {
    wells
        .into_iter()
        .map(|well| (well.well_id, well.elevation_m))
        .collect()
}
