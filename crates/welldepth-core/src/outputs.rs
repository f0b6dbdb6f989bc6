use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibrator::DeploymentCalibration;
use crate::error::Result;
use crate::types::{DailyRecord, GroundReferencedSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

fn micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

/// The serde name of a unit enum variant, e.g. `extrapolated_forward`.
fn serialized_name<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn datetime_series(name: &str, values: Vec<Option<i64>>) -> PolarsResult<Series> {
    Series::new(name.into(), values).cast(&DataType::Datetime(TimeUnit::Microseconds, None))
}

/// Columns: well_id, timestamp, deployment_id, ground_to_water_depth, raw_level, baro_level,
/// compensated_level, temperature. Depths and levels are metres.
pub fn subdaily_frame(samples: &[GroundReferencedSample]) -> PolarsResult<DataFrame> {
    let well_id: Vec<&str> = samples.iter().map(|s| s.well_id.as_str()).collect();
    let timestamp = samples.iter().map(|s| Some(micros(s.timestamp))).collect();
    let deployment_id: Vec<u32> = samples.iter().map(|s| s.deployment_id).collect();
    let depth: Vec<f64> = samples.iter().map(|s| s.ground_to_water_depth_m).collect();
    let raw: Vec<f64> = samples.iter().map(|s| s.raw_level_m).collect();
    let baro: Vec<Option<f64>> = samples.iter().map(|s| s.baro_level_m).collect();
    let compensated: Vec<f64> = samples.iter().map(|s| s.compensated_level_m).collect();
    let temperature: Vec<Option<f64>> = samples.iter().map(|s| s.temperature).collect();

    DataFrame::new(vec![
        Series::new("well_id".into(), well_id).into(),
        datetime_series("timestamp", timestamp)?.into(),
        Series::new("deployment_id".into(), deployment_id).into(),
        Series::new("ground_to_water_depth".into(), depth).into(),
        Series::new("raw_level".into(), raw).into(),
        Series::new("baro_level".into(), baro).into(),
        Series::new("compensated_level".into(), compensated).into(),
        Series::new("temperature".into(), temperature).into(),
    ])
}

/// Columns: well_id, timestamp, ground_to_water_depth, source.
pub fn daily_frame(records: &[DailyRecord]) -> PolarsResult<DataFrame> {
    let well_id: Vec<&str> = records.iter().map(|r| r.well_id.as_str()).collect();
    let timestamp = records.iter().map(|r| Some(micros(r.timestamp))).collect();
    let depth: Vec<f64> = records.iter().map(|r| r.ground_to_water_depth_m).collect();
    let source: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();

    DataFrame::new(vec![
        Series::new("well_id".into(), well_id).into(),
        datetime_series("timestamp", timestamp)?.into(),
        Series::new("ground_to_water_depth".into(), depth).into(),
        Series::new("source".into(), source).into(),
    ])
}

/// One row per deployment, anchored or not, ordered by (well_id, deployment_id).
pub fn anchors_frame(calibrations: &[DeploymentCalibration]) -> PolarsResult<DataFrame> {
    let mut rows: Vec<&DeploymentCalibration> = calibrations.iter().collect();
    rows.sort_by(|a, b| {
        a.well_id
            .cmp(&b.well_id)
            .then(a.deployment_id.cmp(&b.deployment_id))
    });

    let well_id: Vec<&str> = rows.iter().map(|c| c.well_id.as_str()).collect();
    let deployment_id: Vec<u32> = rows.iter().map(|c| c.deployment_id).collect();
    let start = rows.iter().map(|c| c.start.map(micros)).collect();
    let end = rows.iter().map(|c| c.end.map(micros)).collect();
    let sample_count: Vec<u32> = rows.iter().map(|c| c.sample_count as u32).collect();
    let anchor_count: Vec<u32> = rows.iter().map(|c| c.anchors.len() as u32).collect();
    let sensor_depth: Vec<Option<f64>> = rows
        .iter()
        .map(|c| c.result.as_ref().ok().map(|a| a.sensor_depth_below_ground_m))
        .collect();
    let drift_error: Vec<Option<f64>> = rows
        .iter()
        .map(|c| c.result.as_ref().ok().and_then(|a| a.drift_error_m))
        .collect();
    let status: Vec<String> = rows
        .iter()
        .map(|c| match &c.result {
            Ok(_) => "anchored".to_string(),
            Err(reason) => serialized_name(reason),
        })
        .collect();
    let methods: Vec<String> = rows
        .iter()
        .map(|c| {
            c.anchors
                .iter()
                .map(|a| serialized_name(&a.method))
                .collect::<Vec<_>>()
                .join(";")
        })
        .collect();

    DataFrame::new(vec![
        Series::new("well_id".into(), well_id).into(),
        Series::new("deployment_id".into(), deployment_id).into(),
        datetime_series("start", start)?.into(),
        datetime_series("end", end)?.into(),
        Series::new("sample_count".into(), sample_count).into(),
        Series::new("anchor_count".into(), anchor_count).into(),
        Series::new("sensor_depth_below_ground".into(), sensor_depth).into(),
        Series::new("drift_error".into(), drift_error).into(),
        Series::new("status".into(), status).into(),
        Series::new("anchor_methods".into(), methods).into(),
    ])
}

pub fn output_path(dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}

pub fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path)?;
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Zstd(None))
                .with_statistics(StatisticsOptions::default())
                .finish(df)?;
        }
    }
    Ok(())
}
