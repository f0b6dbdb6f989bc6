use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// What the edge trimmer does when a file matches more than one field-note window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousWindowPolicy {
    #[default]
    Skip,
    UseFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    #[default]
    RemoveAllViolations,
    RemoveWaterFlagConflicts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepthUnit {
    #[default]
    Cm,
    M,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub trim_edges: bool,
    pub apply_barometric_correction: bool,
    pub log_level: LogLevel,
    pub sample_interval_minutes: i64,
    pub trim_buffer_minutes: i64,
    pub window_match_buffer_hours: i64,
    pub ambiguous_window_policy: AmbiguousWindowPolicy,
    pub iqr_multiplier: f64,
    pub reference_elevation_m: f64,
    pub baro_resample_minutes: Option<i64>,
    pub max_resample_gap_minutes: i64,
    pub anchor_window_intervals: i64,
    pub manual_depth_unit: DepthUnit,
    pub depth_buffer_cm: f64,
    pub correction_policy: CorrectionPolicy,
    pub daily_reference_time: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trim_edges: true,
            apply_barometric_correction: true,
            log_level: LogLevel::Info,
            sample_interval_minutes: 10,
            trim_buffer_minutes: 10,
            window_match_buffer_hours: 8,
            ambiguous_window_policy: AmbiguousWindowPolicy::Skip,
            iqr_multiplier: 5.0,
            reference_elevation_m: 0.0,
            baro_resample_minutes: None,
            max_resample_gap_minutes: 180,
            anchor_window_intervals: 3,
            manual_depth_unit: DepthUnit::Cm,
            depth_buffer_cm: 2.0,
            correction_policy: CorrectionPolicy::RemoveAllViolations,
            daily_reference_time: "08:00".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("sample_interval_minutes", self.sample_interval_minutes),
            ("max_resample_gap_minutes", self.max_resample_gap_minutes),
            ("anchor_window_intervals", self.anchor_window_intervals),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(ConfigError::NonPositive {
                    field,
                    value: value as f64,
                });
            }
        }
        if let Some(minutes) = self.baro_resample_minutes {
            if minutes <= 0 {
                return Err(ConfigError::NonPositive {
                    field: "baro_resample_minutes",
                    value: minutes as f64,
                });
            }
        }

        let non_negative = [
            ("trim_buffer_minutes", self.trim_buffer_minutes as f64),
            ("window_match_buffer_hours", self.window_match_buffer_hours as f64),
            ("iqr_multiplier", self.iqr_multiplier),
            ("depth_buffer_cm", self.depth_buffer_cm),
        ];
        for (field, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        self.reference_time()?;
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::minutes(self.sample_interval_minutes)
    }

    pub fn trim_buffer(&self) -> Duration {
        Duration::minutes(self.trim_buffer_minutes)
    }

    pub fn window_match_buffer(&self) -> Duration {
        Duration::hours(self.window_match_buffer_hours)
    }

    pub fn max_resample_gap(&self) -> Duration {
        Duration::minutes(self.max_resample_gap_minutes)
    }

    /// Half-width of the window in which a manual reading may anchor a deployment.
    pub fn anchor_window(&self) -> Duration {
        Duration::minutes(self.sample_interval_minutes * self.anchor_window_intervals)
    }

    pub fn depth_buffer_m(&self) -> f64 {
        crate::units::cm_to_m(self.depth_buffer_cm)
    }

    pub fn reference_time(&self) -> Result<NaiveTime, ConfigError> {
        let raw = self.daily_reference_time.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|_| ConfigError::InvalidReferenceTime(self.daily_reference_time.clone()))
    }
}
