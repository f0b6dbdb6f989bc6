use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use welldepth_parser::WellDimensionRow;

use crate::config::{CorrectionPolicy, PipelineConfig};
use crate::report::{IssueKind, IssueLog, RunIssue, Stage};
use crate::types::{GroundReferencedSample, ManualMeasurement};
use crate::units::cm_to_m;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A depth was recorded although the well was marked dry.
    WaterFlagConflict,
    ExceedsWellDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSubject {
    Manual,
    Subdaily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Removed,
    Reported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthViolation {
    pub well_id: String,
    pub timestamp: NaiveDateTime,
    pub subject: ViolationSubject,
    pub kind: ViolationKind,
    pub ground_to_water_m: f64,
    pub well_depth_m: Option<f64>,
    pub disposition: Disposition,
}

/// Physical well depth history in metres, per well.
#[derive(Debug, Clone, Default)]
pub struct WellDepths {
    by_well: HashMap<String, Vec<(NaiveDateTime, f64)>>,
}

impl WellDepths {
    /// Keeps valid rows that carry a depth.
    pub fn from_rows(rows: Vec<WellDimensionRow>) -> Self {
        let mut by_well: HashMap<String, Vec<(NaiveDateTime, f64)>> = HashMap::new();
        for row in rows.into_iter().filter(|row| row.valid) {
            if let Some(depth_cm) = row.well_depth_cm {
                by_well
                    .entry(row.well_id)
                    .or_default()
                    .push((row.effective_timestamp, cm_to_m(depth_cm)));
            }
        }
        for history in by_well.values_mut() {
            history.sort_by_key(|(effective, _)| *effective);
        }
        Self { by_well }
    }

    /// Depth in effect at `at`: the latest row whose effective time is not after it.
    pub fn depth_at(&self, well_id: &str, at: NaiveDateTime) -> Option<f64> {
        self.by_well
            .get(well_id)?
            .iter()
            .rev()
            .find(|(effective, _)| *effective <= at)
            .map(|(_, depth)| *depth)
    }

    pub fn rename_wells(self, rename: impl Fn(&str) -> String) -> Self {
        let mut by_well: HashMap<String, Vec<(NaiveDateTime, f64)>> = HashMap::new();
        for (well, history) in self.by_well {
            by_well.entry(rename(&well)).or_default().extend(history);
        }
        for history in by_well.values_mut() {
            history.sort_by_key(|(effective, _)| *effective);
        }
        Self { by_well }
    }
}

fn disposition(kind: ViolationKind, policy: CorrectionPolicy) -> Disposition {
    match (kind, policy) {
        (_, CorrectionPolicy::RemoveAllViolations) => Disposition::Removed,
        (ViolationKind::WaterFlagConflict, CorrectionPolicy::RemoveWaterFlagConflicts) => {
            Disposition::Removed
        }
        (ViolationKind::ExceedsWellDepth, CorrectionPolicy::RemoveWaterFlagConflicts) => {
            Disposition::Reported
        }
    }
}

/// Every violation of one observation. A dry-flagged reading deeper than the well carries
/// both kinds.
fn violation_kinds(
    depth_m: f64,
    water_present: bool,
    well_depth_m: Option<f64>,
    config: &PipelineConfig,
) -> Vec<ViolationKind> {
    let mut kinds = Vec::new();
    if !water_present {
        kinds.push(ViolationKind::WaterFlagConflict);
    }
    if let Some(limit) = well_depth_m {
        if depth_m > limit + config.depth_buffer_m() {
            kinds.push(ViolationKind::ExceedsWellDepth);
        }
    }
    kinds
}

/// Appends the observation's violations and returns whether it survives the correction policy.
#[allow(clippy::too_many_arguments)]
fn check(
    well_id: &str,
    at: NaiveDateTime,
    subject: ViolationSubject,
    depth_m: Option<f64>,
    water_present: bool,
    depths: &WellDepths,
    config: &PipelineConfig,
    violations: &mut Vec<DepthViolation>,
) -> bool {
    let Some(depth_m) = depth_m else {
        return true;
    };
    let well_depth_m = depths.depth_at(well_id, at);
    let mut keep = true;
    for kind in violation_kinds(depth_m, water_present, well_depth_m, config) {
        let disposition = disposition(kind, config.correction_policy);
        keep &= disposition == Disposition::Reported;
        violations.push(DepthViolation {
            well_id: well_id.to_string(),
            timestamp: at,
            subject,
            kind,
            ground_to_water_m: depth_m,
            well_depth_m,
            disposition,
        });
    }
    keep
}

fn record_removals(violations: &[DepthViolation], subject: &str, issues: &mut IssueLog) {
    // An observation with two removed violations is one removed record.
    let mut removed_by_well: BTreeMap<&str, BTreeSet<NaiveDateTime>> = BTreeMap::new();
    for violation in violations
        .iter()
        .filter(|v| v.disposition == Disposition::Removed)
    {
        removed_by_well
            .entry(violation.well_id.as_str())
            .or_default()
            .insert(violation.timestamp);
    }
    for (well_id, removed) in removed_by_well {
        let count = removed.len();
        issues.record(
            RunIssue::new(
                Stage::Validation,
                IssueKind::ValidationRemoved,
                format!("{count} {subject} record(s) removed by depth validation"),
            )
            .for_well(well_id),
        );
    }
}

/// Checks manual readings against the dry flag and the well depth.
pub fn validate_manual(
    measurements: Vec<ManualMeasurement>,
    depths: &WellDepths,
    config: &PipelineConfig,
    issues: &mut IssueLog,
) -> (Vec<ManualMeasurement>, Vec<DepthViolation>) {
    let mut kept = Vec::with_capacity(measurements.len());
    let mut violations = Vec::new();

    for measurement in measurements {
        let keep = check(
            &measurement.well_id,
            measurement.timestamp,
            ViolationSubject::Manual,
            measurement.ground_to_water_m,
            measurement.water_present,
            depths,
            config,
            &mut violations,
        );
        if keep {
            kept.push(measurement);
        }
    }

    record_removals(&violations, "manual", issues);
    (kept, violations)
}

/// Checks ground-referenced samples against the well depth.
pub fn validate_subdaily(
    samples: Vec<GroundReferencedSample>,
    depths: &WellDepths,
    config: &PipelineConfig,
    issues: &mut IssueLog,
) -> (Vec<GroundReferencedSample>, Vec<DepthViolation>) {
    let mut kept = Vec::with_capacity(samples.len());
    let mut violations = Vec::new();

    for sample in samples {
        let keep = check(
            &sample.well_id,
            sample.timestamp,
            ViolationSubject::Subdaily,
            Some(sample.ground_to_water_depth_m),
            true,
            depths,
            config,
            &mut violations,
        );
        if keep {
            kept.push(sample);
        }
    }

    record_removals(&violations, "subdaily", issues);
    (kept, violations)
}
