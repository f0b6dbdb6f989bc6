use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Anything ordered on a single time axis.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

/// One logger reading, level already converted to metres of head above the sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSample {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub level_m: f64,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaroSource {
    /// Barologger installed at the field site.
    OnSite,
    /// Independent weather station.
    RemoteStation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarometricSample {
    pub timestamp: NaiveDateTime,
    pub pressure_kpa: f64,
    pub temperature: Option<f64>,
    pub source: BaroSource,
    pub elevation_m: f64,
}

/// Manual ground-to-water reading in metres. `None` depth means nothing was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualMeasurement {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub ground_to_water_m: Option<f64>,
    pub water_present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensatedSample {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub raw_level_m: f64,
    pub baro_level_m: Option<f64>,
    pub compensated_level_m: f64,
    pub temperature: Option<f64>,
}

/// A contiguous run of samples from one well.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment<T> {
    pub well_id: String,
    pub deployment_id: u32,
    pub samples: Vec<T>,
}

impl<T: Timestamped> Deployment<T> {
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.samples.first().map(Timestamped::timestamp)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(Timestamped::timestamp)
    }
}

/// Fixed offset between the sensor and the ground surface for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAnchor {
    pub well_id: String,
    pub deployment_id: u32,
    pub sensor_depth_below_ground_m: f64,
    /// Standard error of the anchor estimates; only set with two or more anchors.
    pub drift_error_m: Option<f64>,
    pub anchor_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundReferencedSample {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub deployment_id: u32,
    pub ground_to_water_depth_m: f64,
    pub raw_level_m: f64,
    pub baro_level_m: Option<f64>,
    pub compensated_level_m: f64,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DailySource {
    Logger,
    Manual,
}

impl DailySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DailySource::Logger => "logger",
            DailySource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub ground_to_water_depth_m: f64,
    pub source: DailySource,
}

impl Timestamped for SensorSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl Timestamped for BarometricSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl Timestamped for CompensatedSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl Timestamped for GroundReferencedSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl Timestamped for NaiveDateTime {
    fn timestamp(&self) -> NaiveDateTime {
        *self
    }
}
