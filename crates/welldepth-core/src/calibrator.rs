use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::report::{IssueKind, IssueLog, RunIssue, Stage};
use crate::stats::{mean, standard_error};
use crate::types::{
    CompensatedSample, Deployment, GroundReferencedSample, ManualMeasurement, SensorAnchor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMethod {
    Exact,
    Interpolated,
    /// Manual reading after the last sample.
    ExtrapolatedForward,
    /// Manual reading before the first sample.
    ExtrapolatedBackward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoAnchorData,
    AmbiguousWindow,
    InsufficientBracket,
    /// Manual readings at the same time disagree on the depth.
    ConflictingManual,
}

impl SkipReason {
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            SkipReason::NoAnchorData => IssueKind::NoAnchorData,
            SkipReason::AmbiguousWindow => IssueKind::AmbiguousWindow,
            SkipReason::InsufficientBracket => IssueKind::InsufficientBracket,
            SkipReason::ConflictingManual => IssueKind::ConflictingManual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorEstimate {
    pub manual_timestamp: NaiveDateTime,
    pub method: AnchorMethod,
    pub pressure_head_m: f64,
    pub manual_depth_m: f64,
    pub sensor_depth_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAnchor {
    pub manual_timestamp: NaiveDateTime,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentCalibration {
    pub well_id: String,
    pub deployment_id: u32,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub sample_count: usize,
    pub anchors: Vec<AnchorEstimate>,
    pub skipped: Vec<SkippedAnchor>,
    /// Repeated readings (same time, same depth) collapsed before anchoring.
    pub duplicate_readings: usize,
    pub result: Result<SensorAnchor, SkipReason>,
}

/// Compensated level at `at`: exact sample, linear bracket, or linear extrapolation from the
/// two nearest samples on the only available side.
pub fn pressure_head_at(
    samples: &[CompensatedSample],
    at: NaiveDateTime,
) -> Result<(f64, AnchorMethod), SkipReason> {
    let idx = samples.partition_point(|s| s.timestamp < at);

    if let Some(sample) = samples.get(idx).filter(|s| s.timestamp == at) {
        return Ok((sample.compensated_level_m, AnchorMethod::Exact));
    }

    match (idx.checked_sub(1).and_then(|i| samples.get(i)), samples.get(idx)) {
        (Some(before), Some(after)) => Ok((
            interpolate(before, after, at),
            AnchorMethod::Interpolated,
        )),
        (Some(_), None) if samples.len() >= 2 => {
            let (a, b) = (&samples[idx - 2], &samples[idx - 1]);
            Ok((interpolate(a, b, at), AnchorMethod::ExtrapolatedForward))
        }
        (None, Some(_)) if samples.len() >= 2 => {
            let (a, b) = (&samples[0], &samples[1]);
            Ok((interpolate(a, b, at), AnchorMethod::ExtrapolatedBackward))
        }
        _ => Err(SkipReason::InsufficientBracket),
    }
}

/// Value of the line through `a` and `b` at `at`.
fn interpolate(a: &CompensatedSample, b: &CompensatedSample, at: NaiveDateTime) -> f64 {
    let span = (b.timestamp - a.timestamp).num_milliseconds() as f64;
    if span == 0.0 {
        return a.compensated_level_m;
    }
    let fraction = (at - a.timestamp).num_milliseconds() as f64 / span;
    a.compensated_level_m + (b.compensated_level_m - a.compensated_level_m) * fraction
}

fn distance_to(deployment: &Deployment<CompensatedSample>, at: NaiveDateTime) -> Option<Duration> {
    let (start, end) = (deployment.start()?, deployment.end()?);
    Some(if at < start {
        start - at
    } else if at > end {
        at - end
    } else {
        Duration::zero()
    })
}

/// Assigns each usable manual reading to the closest deployment whose span, widened by
/// `window`, contains it. Ties go to the earlier deployment.
pub fn assign_manual<'a>(
    deployments: &[Deployment<CompensatedSample>],
    manual: &'a [ManualMeasurement],
    window: Duration,
) -> Vec<Vec<&'a ManualMeasurement>> {
    let mut assigned: Vec<Vec<&ManualMeasurement>> = vec![Vec::new(); deployments.len()];

    for measurement in manual
        .iter()
        .filter(|m| m.water_present && m.ground_to_water_m.is_some())
    {
        let best = deployments
            .iter()
            .enumerate()
            .filter_map(|(idx, d)| {
                let distance = distance_to(d, measurement.timestamp)?;
                (distance <= window).then_some((distance, idx))
            })
            .min();
        if let Some((_, idx)) = best {
            assigned[idx].push(measurement);
        }
    }
    assigned
}

/// Estimates the sensor's depth below ground for one deployment.
///
/// Each manual reading gives `sensor_depth = pressure_head + ground_to_water`. The deployment
/// anchor is the arithmetic mean of those estimates; drift error is their standard error and
/// needs at least two independent readings. Repeated readings count once; readings sharing a
/// timestamp but disagreeing are skipped as conflicting.
pub fn calibrate_deployment(
    deployment: &Deployment<CompensatedSample>,
    manual: &[&ManualMeasurement],
) -> DeploymentCalibration {
    let mut readings: Vec<(NaiveDateTime, f64)> = Vec::with_capacity(manual.len());
    let mut duplicate_readings = 0;
    for measurement in manual {
        let Some(depth) = measurement.ground_to_water_m else {
            continue;
        };
        if readings.contains(&(measurement.timestamp, depth)) {
            duplicate_readings += 1;
        } else {
            readings.push((measurement.timestamp, depth));
        }
    }

    let mut anchors = Vec::new();
    let mut skipped = Vec::new();

    for &(manual_timestamp, manual_depth_m) in &readings {
        let conflicting = readings
            .iter()
            .any(|&(at, depth)| at == manual_timestamp && depth != manual_depth_m);
        if conflicting {
            skipped.push(SkippedAnchor {
                manual_timestamp,
                reason: SkipReason::ConflictingManual,
            });
            continue;
        }

        match pressure_head_at(&deployment.samples, manual_timestamp) {
            Ok((pressure_head_m, method)) => anchors.push(AnchorEstimate {
                manual_timestamp,
                method,
                pressure_head_m,
                manual_depth_m,
                sensor_depth_m: pressure_head_m + manual_depth_m,
            }),
            Err(reason) => skipped.push(SkippedAnchor {
                manual_timestamp,
                reason,
            }),
        }
    }

    let estimates: Vec<f64> = anchors.iter().map(|a| a.sensor_depth_m).collect();
    let result = match mean(&estimates) {
        Some(sensor_depth) => Ok(SensorAnchor {
            well_id: deployment.well_id.clone(),
            deployment_id: deployment.deployment_id,
            sensor_depth_below_ground_m: sensor_depth,
            drift_error_m: standard_error(&estimates),
            anchor_count: estimates.len(),
        }),
        None if skipped.is_empty() => Err(SkipReason::NoAnchorData),
        None if skipped
            .iter()
            .any(|s| s.reason == SkipReason::InsufficientBracket) =>
        {
            Err(SkipReason::InsufficientBracket)
        }
        None => Err(SkipReason::ConflictingManual),
    };

    DeploymentCalibration {
        well_id: deployment.well_id.clone(),
        deployment_id: deployment.deployment_id,
        start: deployment.start(),
        end: deployment.end(),
        sample_count: deployment.samples.len(),
        anchors,
        skipped,
        duplicate_readings,
        result,
    }
}

/// `ground_to_water = sensor_depth − compensated_level` for every sample.
pub fn apply_anchor(
    deployment: Deployment<CompensatedSample>,
    anchor: &SensorAnchor,
) -> Vec<GroundReferencedSample> {
    let deployment_id = deployment.deployment_id;
    deployment
        .samples
        .into_iter()
        .map(|s| GroundReferencedSample {
            well_id: s.well_id,
            timestamp: s.timestamp,
            deployment_id,
            ground_to_water_depth_m: anchor.sensor_depth_below_ground_m - s.compensated_level_m,
            raw_level_m: s.raw_level_m,
            baro_level_m: s.baro_level_m,
            compensated_level_m: s.compensated_level_m,
            temperature: s.temperature,
        })
        .collect()
}

/// Calibrates every deployment of one well. Deployments without an anchor are dropped from
/// the sample output and reported.
pub fn calibrate_well(
    deployments: Vec<Deployment<CompensatedSample>>,
    manual: &[ManualMeasurement],
    window: Duration,
    issues: &mut IssueLog,
) -> (Vec<DeploymentCalibration>, Vec<GroundReferencedSample>) {
    let assigned = assign_manual(&deployments, manual, window);
    let mut calibrations = Vec::with_capacity(deployments.len());
    let mut samples = Vec::new();

    for (deployment, readings) in deployments.into_iter().zip(assigned) {
        let calibration = calibrate_deployment(&deployment, &readings);

        if calibration.duplicate_readings > 0 {
            issues.record(
                RunIssue::new(
                    Stage::Calibration,
                    IssueKind::DuplicateManual,
                    format!(
                        "{} repeated manual reading(s) counted once",
                        calibration.duplicate_readings
                    ),
                )
                .for_well(&deployment.well_id)
                .for_deployment(deployment.deployment_id),
            );
        }

        for skip in &calibration.skipped {
            issues.record(
                RunIssue::new(
                    Stage::Calibration,
                    skip.reason.issue_kind(),
                    format!("manual reading at {} not used as an anchor", skip.manual_timestamp),
                )
                .for_well(&deployment.well_id)
                .for_deployment(deployment.deployment_id),
            );
        }

        match &calibration.result {
            Ok(anchor) => {
                debug!(
                    well_id = %anchor.well_id,
                    deployment_id = anchor.deployment_id,
                    sensor_depth_m = anchor.sensor_depth_below_ground_m,
                    drift_error_m = ?anchor.drift_error_m,
                    anchors = anchor.anchor_count,
                    "deployment anchored"
                );
                samples.extend(apply_anchor(deployment, anchor));
            }
            Err(reason) => {
                issues.record(
                    RunIssue::new(
                        Stage::Calibration,
                        IssueKind::DeploymentDropped,
                        format!(
                            "deployment of {} samples dropped without ground reference ({reason:?})",
                            calibration.sample_count
                        ),
                    )
                    .for_well(&deployment.well_id)
                    .for_deployment(deployment.deployment_id),
                );
            }
        }
        calibrations.push(calibration);
    }

    (calibrations, samples)
}
