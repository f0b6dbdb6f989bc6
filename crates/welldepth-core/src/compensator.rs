use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::report::{IssueKind, IssueLog, RunIssue, Stage};
use crate::types::{CompensatedSample, SensorSample};
use crate::units::{adjust_pressure_for_elevation, kpa_to_head_m};

/// Barometric pressure at the reference elevation, keyed by timestamp.
pub type BaroLookup = HashMap<NaiveDateTime, f64>;

/// Atmospheric head at a well: the reference-elevation pressure moved to the well and
/// expressed in metres of water.
pub fn baro_head_m(pressure_kpa: f64, reference_elevation_m: f64, well_elevation_m: f64) -> f64 {
    kpa_to_head_m(adjust_pressure_for_elevation(
        pressure_kpa,
        reference_elevation_m,
        well_elevation_m,
        None,
    ))
}

/// Subtracts atmospheric head from one well's samples.
///
/// Samples are joined on exact timestamps; samples without a barometric reading are dropped
/// and counted. `baro` of `None` means correction is disabled and levels pass through.
pub fn compensate(
    well_id: &str,
    samples: Vec<SensorSample>,
    baro: Option<&BaroLookup>,
    well_elevation_m: Option<f64>,
    config: &PipelineConfig,
    issues: &mut IssueLog,
) -> Vec<CompensatedSample> {
    let Some(baro) = baro else {
        return samples
            .into_iter()
            .map(|s| CompensatedSample {
                well_id: s.well_id,
                timestamp: s.timestamp,
                raw_level_m: s.level_m,
                baro_level_m: None,
                compensated_level_m: s.level_m,
                temperature: s.temperature,
            })
            .collect();
    };

    let reference = config.reference_elevation_m;
    let elevation = match well_elevation_m {
        Some(elevation) => elevation,
        None => {
            issues.record(
                RunIssue::new(
                    Stage::Compensation,
                    IssueKind::MissingElevation,
                    format!("no elevation for well; using reference elevation {reference} m"),
                )
                .for_well(well_id),
            );
            reference
        }
    };

    let total = samples.len();
    let compensated: Vec<CompensatedSample> = samples
        .into_iter()
        .filter_map(|s| {
            let pressure = baro.get(&s.timestamp)?;
            let baro_level = baro_head_m(*pressure, reference, elevation);
            Some(CompensatedSample {
                well_id: s.well_id,
                timestamp: s.timestamp,
                raw_level_m: s.level_m,
                baro_level_m: Some(baro_level),
                compensated_level_m: s.level_m - baro_level,
                temperature: s.temperature,
            })
        })
        .collect();

    let unmatched = total - compensated.len();
    if unmatched > 0 {
        issues.record(
            RunIssue::new(
                Stage::Compensation,
                IssueKind::UnmatchedBarometric,
                format!("{unmatched} of {total} samples had no barometric reading and were dropped"),
            )
            .for_well(well_id),
        );
    }
    debug!(well_id, kept = compensated.len(), unmatched, "compensated well");
    compensated
}
