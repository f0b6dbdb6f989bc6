use std::collections::{BTreeMap, HashMap};

use tracing::{info, info_span};

use crate::assembler::{assemble_daily, assemble_subdaily};
use crate::barometric::{normalize, YearOffset};
use crate::calibrator::{calibrate_well, DeploymentCalibration};
use crate::compensator::{compensate, BaroLookup};
use crate::config::{AmbiguousWindowPolicy, PipelineConfig};
use crate::edge_trimmer::{match_window, trim_edges, FieldWindow, TrimReport, WindowMatch};
use crate::error::{PipelineError, Result};
use crate::ingest::SensorFile;
use crate::report::{IssueKind, IssueLog, RunCounts, RunIssue, Stage};
use crate::segmenter::segment;
use crate::types::{BarometricSample, DailyRecord, GroundReferencedSample, ManualMeasurement, SensorSample};
use crate::validation::{validate_manual, validate_subdaily, DepthViolation, WellDepths};
use crate::wells::WellRegistry;

/// Everything the pipeline consumes, already parsed and converted to metres and kPa.
#[derive(Debug, Default)]
pub struct PipelineInputs {
    pub sensor_files: Vec<SensorFile>,
    pub field_windows: Vec<FieldWindow>,
    pub on_site_baro: Vec<BarometricSample>,
    pub station_baro: Vec<BarometricSample>,
    pub manual: Vec<ManualMeasurement>,
    pub well_depths: WellDepths,
    pub elevations: HashMap<String, f64>,
    pub wells: WellRegistry,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub subdaily: Vec<GroundReferencedSample>,
    pub daily: Vec<DailyRecord>,
    pub calibrations: Vec<DeploymentCalibration>,
    pub trims: Vec<TrimReport>,
    pub baro_offsets: Vec<YearOffset>,
    pub violations: Vec<DepthViolation>,
    pub issues: Vec<RunIssue>,
    pub counts: RunCounts,
}

/// Runs trim, barometric normalization, compensation, segmentation, calibration,
/// validation and assembly in order. Per-well problems are recorded, not returned.
pub fn run_pipeline(inputs: PipelineInputs, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let reference_time = config.reference_time()?;
    let mut issues = IssueLog::new();

    let PipelineInputs {
        sensor_files,
        field_windows,
        on_site_baro,
        station_baro,
        manual,
        well_depths,
        elevations,
        wells,
    } = inputs;

    let field_windows: Vec<FieldWindow> = field_windows
        .into_iter()
        .map(|mut window| {
            window.well_id = wells.canonical(&window.well_id);
            window
        })
        .collect();
    let elevations: HashMap<String, f64> = elevations
        .into_iter()
        .map(|(well, elevation)| (wells.canonical(&well), elevation))
        .collect();
    let well_depths = well_depths.rename_wells(|well| wells.canonical(well));

    let files_by_well = resolve_sensor_files(sensor_files, &wells, &mut issues);
    let manual = resolve_manual(manual, &wells, &mut issues);

    let (manual, mut violations) = validate_manual(manual, &well_depths, config, &mut issues);
    let mut manual_by_well: HashMap<String, Vec<ManualMeasurement>> = HashMap::new();
    for measurement in &manual {
        manual_by_well
            .entry(measurement.well_id.clone())
            .or_default()
            .push(measurement.clone());
    }
    for readings in manual_by_well.values_mut() {
        readings.sort_by_key(|m| m.timestamp);
    }

    let mut trims = Vec::new();
    let mut well_series: BTreeMap<String, Vec<SensorSample>> = BTreeMap::new();
    for (well_id, files) in files_by_well {
        let _span = info_span!("edge_trim", well_id = %well_id).entered();
        if let Some(samples) = trim_well(&well_id, files, &field_windows, config, &mut trims, &mut issues) {
            well_series.insert(well_id, samples);
        }
    }

    let baro = if config.apply_barometric_correction {
        let normalized = normalize(on_site_baro, station_baro, config, &mut issues)
            .ok_or(PipelineError::MissingBarometer)?;
        Some(normalized)
    } else {
        None
    };
    let baro_lookup: Option<BaroLookup> = baro.as_ref().map(|b| b.lookup());

    let mut calibrations = Vec::new();
    let mut referenced = Vec::new();
    let mut counts = RunCounts {
        wells: well_series.len(),
        ..RunCounts::default()
    };

    for (well_id, samples) in well_series {
        let _span = info_span!("calibrate", well_id = %well_id).entered();
        let compensated = compensate(
            &well_id,
            samples,
            baro_lookup.as_ref(),
            elevations.get(&well_id).copied(),
            config,
            &mut issues,
        );
        let deployments = segment(&well_id, compensated, config.sample_interval());
        counts.deployments += deployments.len();

        let well_manual = manual_by_well.get(&well_id).map(Vec::as_slice).unwrap_or(&[]);
        let (well_calibrations, well_samples) =
            calibrate_well(deployments, well_manual, config.anchor_window(), &mut issues);
        calibrations.extend(well_calibrations);
        referenced.extend(well_samples);
    }

    let (referenced, subdaily_violations) =
        validate_subdaily(referenced, &well_depths, config, &mut issues);
    violations.extend(subdaily_violations);

    let subdaily = assemble_subdaily(referenced);
    let daily = assemble_daily(&subdaily, &manual, reference_time);

    counts.calibrated_deployments = calibrations.iter().filter(|c| c.result.is_ok()).count();
    counts.dropped_deployments = calibrations.len() - counts.calibrated_deployments;
    counts.subdaily_rows = subdaily.len();
    counts.daily_rows = daily.len();
    counts.violations = violations.len();
    counts.issues = issues.len();

    info!(
        wells = counts.wells,
        deployments = counts.deployments,
        dropped = counts.dropped_deployments,
        subdaily_rows = counts.subdaily_rows,
        daily_rows = counts.daily_rows,
        issues = counts.issues,
        "pipeline finished"
    );

    Ok(PipelineOutput {
        subdaily,
        daily,
        calibrations,
        trims,
        baro_offsets: baro.map(|b| b.offsets).unwrap_or_default(),
        violations,
        issues: issues.into_vec(),
        counts,
    })
}

fn resolve_sensor_files(
    files: Vec<SensorFile>,
    wells: &WellRegistry,
    issues: &mut IssueLog,
) -> BTreeMap<String, Vec<SensorFile>> {
    let mut by_well: BTreeMap<String, Vec<SensorFile>> = BTreeMap::new();
    for mut file in files {
        let Some(well_id) = wells.resolve(&file.well_id) else {
            issues.record(
                RunIssue::new(
                    Stage::Ingest,
                    IssueKind::UnknownWell,
                    format!("logger file {} names an unknown well; skipped", file.label),
                )
                .for_well(&file.well_id),
            );
            continue;
        };
        for sample in file.samples.iter_mut() {
            sample.well_id = well_id.clone();
        }
        file.well_id = well_id.clone();
        by_well.entry(well_id).or_default().push(file);
    }
    by_well
}

fn resolve_manual(
    manual: Vec<ManualMeasurement>,
    wells: &WellRegistry,
    issues: &mut IssueLog,
) -> Vec<ManualMeasurement> {
    let mut unknown: BTreeMap<String, usize> = BTreeMap::new();
    let resolved = manual
        .into_iter()
        .filter_map(|mut measurement| match wells.resolve(&measurement.well_id) {
            Some(well_id) => {
                measurement.well_id = well_id;
                Some(measurement)
            }
            None => {
                *unknown.entry(measurement.well_id).or_default() += 1;
                None
            }
        })
        .collect();

    for (well_id, count) in unknown {
        issues.record(
            RunIssue::new(
                Stage::Ingest,
                IssueKind::UnknownWell,
                format!("{count} manual reading(s) name an unknown well; skipped"),
            )
            .for_well(&well_id),
        );
    }
    resolved
}

/// Trims each file of one well and concatenates them. Returns `None` when nothing survives.
fn trim_well(
    well_id: &str,
    files: Vec<SensorFile>,
    windows: &[FieldWindow],
    config: &PipelineConfig,
    trims: &mut Vec<TrimReport>,
    issues: &mut IssueLog,
) -> Option<Vec<SensorSample>> {
    let mut samples: Vec<SensorSample> = Vec::new();

    for file in files {
        if !config.trim_edges {
            samples.extend(file.samples);
            continue;
        }

        let (Some(first), Some(last)) = (
            file.samples.iter().map(|s| s.timestamp).min(),
            file.samples.iter().map(|s| s.timestamp).max(),
        ) else {
            continue;
        };
        let window = match match_window(windows, well_id, first, last, config.window_match_buffer()) {
            WindowMatch::MissingWell => {
                issues.record(
                    RunIssue::new(
                        Stage::EdgeTrim,
                        IssueKind::MissingFieldNotes,
                        "well has no field-note windows; all of its files are skipped",
                    )
                    .for_well(well_id),
                );
                return None;
            }
            WindowMatch::NoMatch => {
                issues.record(
                    RunIssue::new(
                        Stage::EdgeTrim,
                        IssueKind::NoMatchingWindow,
                        format!("no field-note window matches {}; file skipped", file.label),
                    )
                    .for_well(well_id),
                );
                continue;
            }
            WindowMatch::Unique(window) => window,
            WindowMatch::Ambiguous(candidates) => {
                let action = match config.ambiguous_window_policy {
                    AmbiguousWindowPolicy::Skip => "file skipped",
                    AmbiguousWindowPolicy::UseFirst => "using the earliest window",
                };
                issues.record(
                    RunIssue::new(
                        Stage::EdgeTrim,
                        IssueKind::AmbiguousWindow,
                        format!(
                            "{} field-note windows match {}; {action}",
                            candidates.len(),
                            file.label
                        ),
                    )
                    .for_well(well_id),
                );
                match config.ambiguous_window_policy {
                    AmbiguousWindowPolicy::Skip => continue,
                    AmbiguousWindowPolicy::UseFirst => {
                        match candidates.into_iter().min_by_key(|w| w.start) {
                            Some(window) => window,
                            None => continue,
                        }
                    }
                }
            }
        };

        let (trimmed, report) = trim_edges(&file.samples, window, config.trim_buffer(), &file.label);
        trims.push(report);
        samples.extend(trimmed);
    }

    if samples.is_empty() {
        return None;
    }

    samples.sort_by_key(|s| s.timestamp);
    let before = samples.len();
    samples.dedup_by_key(|s| s.timestamp);
    let duplicates = before - samples.len();
    if duplicates > 0 {
        issues.record(
            RunIssue::new(
                Stage::EdgeTrim,
                IssueKind::DuplicateTimestamp,
                format!("{duplicates} duplicate timestamp(s) across files; first sample kept"),
            )
            .for_well(well_id),
        );
    }
    Some(samples)
}
