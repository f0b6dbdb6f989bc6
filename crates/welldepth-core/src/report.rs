use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::barometric::YearOffset;
use crate::calibrator::DeploymentCalibration;
use crate::config::PipelineConfig;
use crate::edge_trimmer::TrimReport;
use crate::pipeline::PipelineOutput;
use crate::validation::DepthViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    EdgeTrim,
    Barometric,
    Compensation,
    Calibration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingFieldNotes,
    NoMatchingWindow,
    AmbiguousWindow,
    UnknownWell,
    MissingElevation,
    UnmatchedBarometric,
    NoBaroOverlap,
    MissingBaroSource,
    DuplicateTimestamp,
    NoAnchorData,
    InsufficientBracket,
    ConflictingManual,
    DuplicateManual,
    DeploymentDropped,
    ValidationRemoved,
    UnreadableInput,
}

/// A non-fatal problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunIssue {
    pub stage: Stage,
    pub well_id: Option<String>,
    pub deployment_id: Option<u32>,
    pub kind: IssueKind,
    pub message: String,
}

impl RunIssue {
    pub fn new(stage: Stage, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            well_id: None,
            deployment_id: None,
            kind,
            message: message.into(),
        }
    }

    pub fn for_well(mut self, well_id: &str) -> Self {
        self.well_id = Some(well_id.to_string());
        self
    }

    pub fn for_deployment(mut self, deployment_id: u32) -> Self {
        self.deployment_id = Some(deployment_id);
        self
    }
}

/// Accumulates issues across stages and logs each one as it arrives.
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Vec<RunIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, issue: RunIssue) {
        warn!(
            stage = ?issue.stage,
            kind = ?issue.kind,
            well_id = issue.well_id.as_deref().unwrap_or("-"),
            deployment_id = ?issue.deployment_id,
            "{}",
            issue.message
        );
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunIssue> {
        self.issues.iter()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<RunIssue> {
        self.issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    Logger,
    OnSiteBarometer,
    StationBarometer,
    FieldNotes,
    Manual,
    WellDimensions,
    WellElevations,
    WellIdCorrections,
    WellIdList,
}

/// Provenance of one file read by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct InputFileRecord {
    pub path: String,
    pub role: InputRole,
    pub blake3: String,
    pub format: Option<String>,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunCounts {
    pub wells: usize,
    pub deployments: usize,
    pub calibrated_deployments: usize,
    pub dropped_deployments: usize,
    pub subdaily_rows: usize,
    pub daily_rows: usize,
    pub violations: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub config: PipelineConfig,
    pub inputs: Vec<InputFileRecord>,
    pub trims: Vec<TrimReport>,
    pub baro_offsets: Vec<YearOffset>,
    pub calibrations: Vec<DeploymentCalibration>,
    pub violations: Vec<DepthViolation>,
    pub issues: Vec<RunIssue>,
    pub counts: RunCounts,
}

impl RunSummary {
    /// `extra_issues` are problems found before the pipeline ran, e.g. unreadable files.
    pub fn new(
        config: &PipelineConfig,
        inputs: Vec<InputFileRecord>,
        output: &PipelineOutput,
        extra_issues: Vec<RunIssue>,
    ) -> Self {
        let mut issues = extra_issues;
        issues.extend(output.issues.iter().cloned());
        let mut counts = output.counts.clone();
        counts.issues = issues.len();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            config: config.clone(),
            inputs,
            trims: output.trims.clone(),
            baro_offsets: output.baro_offsets.clone(),
            calibrations: output.calibrations.clone(),
            violations: output.violations.clone(),
            issues,
            counts,
        }
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
