use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unit of the primary value column in a logger or station export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    Meters,
    Centimeters,
    KiloPascal,
    Millibar,
    InchesMercury,
}

impl MeasurementUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Meters => "m",
            MeasurementUnit::Centimeters => "cm",
            MeasurementUnit::KiloPascal => "kPa",
            MeasurementUnit::Millibar => "mbar",
            MeasurementUnit::InchesMercury => "inHg",
        }
    }

    pub fn is_pressure(&self) -> bool {
        matches!(
            self,
            MeasurementUnit::KiloPascal | MeasurementUnit::Millibar | MeasurementUnit::InchesMercury
        )
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MeasurementUnit {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(MeasurementUnit::Meters),
            "cm" | "centimeter" | "centimeters" => Ok(MeasurementUnit::Centimeters),
            "kpa" => Ok(MeasurementUnit::KiloPascal),
            "mbar" | "mb" | "hpa" | "millibar" => Ok(MeasurementUnit::Millibar),
            "inhg" | "in hg" => Ok(MeasurementUnit::InchesMercury),
            other => Err(format!("unknown measurement unit '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerHeader {
    pub serial_number: Option<String>,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub value_unit: MeasurementUnit,
    pub temperature_unit: Option<String>,
}

impl LoggerHeader {
    pub fn with_unit(value_unit: MeasurementUnit) -> Self {
        Self {
            serial_number: None,
            project_id: None,
            location: None,
            value_unit,
            temperature_unit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoggerReading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ParsedLoggerFile {
    pub format: &'static str,
    pub header: LoggerHeader,
    pub readings: Vec<LoggerReading>,
}

impl ParsedLoggerFile {
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).max()
    }
}

/// Field-note record describing when a logger was installed and removed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNoteRow {
    pub well_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub temp_threshold: f64,
}

/// Manual water-level reading as recorded in the field, before unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualRow {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub ground_to_water: Option<f64>,
    pub water_present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellDimensionRow {
    pub well_id: String,
    pub effective_timestamp: NaiveDateTime,
    pub well_depth_cm: Option<f64>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellIdCorrectionRow {
    pub well_field_id: String,
    pub well_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellElevation {
    pub well_id: String,
    pub elevation_m: f64,
}

/// Extracts the well id from a logger export named like `EWR-1_2018_0727_0824.csv`.
pub fn well_id_from_filename(file_name: &str) -> Option<&str> {
    let stem = file_name.rsplit(['/', '\\']).next()?;
    let (prefix, _) = stem.split_once("_20")?;
    let prefix = prefix.trim();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}
