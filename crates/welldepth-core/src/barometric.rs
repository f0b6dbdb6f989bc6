use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::report::{IssueKind, IssueLog, RunIssue, Stage};
use crate::stats::{mean, median_interval, retain_within_iqr};
use crate::types::BarometricSample;
use crate::units::adjust_pressure_for_elevation;

/// Offset applied to the station series for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOffset {
    pub year: i32,
    pub offset_kpa: f64,
    pub matched_timestamps: usize,
    pub on_site_outliers: usize,
    pub station_outliers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaroPoint {
    pub timestamp: NaiveDateTime,
    pub pressure_kpa: f64,
}

/// One corrected barometric series at the reference elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBarometer {
    pub points: Vec<BaroPoint>,
    pub offsets: Vec<YearOffset>,
    pub interval: Duration,
    pub reference_elevation_m: f64,
}

impl NormalizedBarometer {
    pub fn lookup(&self) -> HashMap<NaiveDateTime, f64> {
        self.points
            .iter()
            .map(|point| (point.timestamp, point.pressure_kpa))
            .collect()
    }
}

/// Moves every sample to `reference_elevation_m`, sorts, and drops repeated timestamps.
fn prepare(mut samples: Vec<BarometricSample>, reference_elevation_m: f64) -> Vec<BarometricSample> {
    for sample in samples.iter_mut() {
        sample.pressure_kpa = adjust_pressure_for_elevation(
            sample.pressure_kpa,
            sample.elevation_m,
            reference_elevation_m,
            sample.temperature,
        );
        sample.elevation_m = reference_elevation_m;
    }
    samples.retain(|s| s.pressure_kpa.is_finite());
    samples.sort_by_key(|s| s.timestamp);
    samples.dedup_by_key(|s| s.timestamp);
    samples
}

fn split_by_year(samples: Vec<BarometricSample>) -> BTreeMap<i32, Vec<BarometricSample>> {
    let mut years: BTreeMap<i32, Vec<BarometricSample>> = BTreeMap::new();
    for sample in samples {
        years.entry(sample.timestamp.year()).or_default().push(sample);
    }
    years
}

fn remove_outliers(
    years: &mut BTreeMap<i32, Vec<BarometricSample>>,
    multiplier: f64,
) -> BTreeMap<i32, usize> {
    years
        .iter_mut()
        .map(|(year, samples)| {
            let removed = retain_within_iqr(samples, multiplier, |s| s.pressure_kpa);
            (*year, removed)
        })
        .collect()
}

/// Reconciles the on-site barologger with the station record and resamples the result.
///
/// Per calendar year, outliers are removed from each source, the mean on-site minus station
/// difference over shared timestamps becomes that year's offset, and the offset is added to
/// the station series. The corrected station series is then linearly resampled onto a
/// midnight-aligned grid at the finer of the two sampling intervals.
pub fn normalize(
    on_site: Vec<BarometricSample>,
    station: Vec<BarometricSample>,
    config: &PipelineConfig,
    issues: &mut IssueLog,
) -> Option<NormalizedBarometer> {
    let reference = config.reference_elevation_m;
    let on_site = prepare(on_site, reference);
    let station = prepare(station, reference);

    let on_site_interval = median_interval(&timestamps(&on_site));
    let station_interval = median_interval(&timestamps(&station));
    let interval = match (config.baro_resample_minutes, on_site_interval, station_interval) {
        (Some(minutes), _, _) => Duration::minutes(minutes),
        (None, Some(a), Some(b)) => a.min(b),
        (None, Some(a), None) | (None, None, Some(a)) => a,
        (None, None, None) => config.sample_interval(),
    };

    let mut on_site_years = split_by_year(on_site);
    let mut station_years = split_by_year(station);
    let on_site_removed = remove_outliers(&mut on_site_years, config.iqr_multiplier);
    let station_removed = remove_outliers(&mut station_years, config.iqr_multiplier);

    let (corrected, offsets) = match (on_site_years.is_empty(), station_years.is_empty()) {
        (true, true) => return None,
        (false, true) => {
            issues.record(RunIssue::new(
                Stage::Barometric,
                IssueKind::MissingBaroSource,
                "no station barometric data; using the on-site barologger alone",
            ));
            (on_site_years.into_values().flatten().collect(), Vec::new())
        }
        (true, false) => {
            issues.record(RunIssue::new(
                Stage::Barometric,
                IssueKind::MissingBaroSource,
                "no on-site barologger data; using the station record alone",
            ));
            (station_years.into_values().flatten().collect(), Vec::new())
        }
        (false, false) => apply_year_offsets(
            &on_site_years,
            station_years,
            &on_site_removed,
            &station_removed,
            issues,
        ),
    };

    let points = resample(&corrected, interval, config.max_resample_gap());
    info!(
        points = points.len(),
        interval_minutes = interval.num_minutes(),
        years = offsets.len(),
        "barometric series normalized"
    );

    Some(NormalizedBarometer {
        points,
        offsets,
        interval,
        reference_elevation_m: reference,
    })
}

fn timestamps(samples: &[BarometricSample]) -> Vec<NaiveDateTime> {
    samples.iter().map(|s| s.timestamp).collect()
}

fn apply_year_offsets(
    on_site_years: &BTreeMap<i32, Vec<BarometricSample>>,
    station_years: BTreeMap<i32, Vec<BarometricSample>>,
    on_site_removed: &BTreeMap<i32, usize>,
    station_removed: &BTreeMap<i32, usize>,
    issues: &mut IssueLog,
) -> (Vec<BarometricSample>, Vec<YearOffset>) {
    let mut corrected = Vec::new();
    let mut offsets = Vec::new();

    for (year, mut samples) in station_years {
        let on_site_by_time: HashMap<NaiveDateTime, f64> = on_site_years
            .get(&year)
            .map(|rows| rows.iter().map(|s| (s.timestamp, s.pressure_kpa)).collect())
            .unwrap_or_default();

        let differences: Vec<f64> = samples
            .iter()
            .filter_map(|s| on_site_by_time.get(&s.timestamp).map(|p| p - s.pressure_kpa))
            .collect();

        let offset_kpa = match mean(&differences) {
            Some(offset) => offset,
            None => {
                issues.record(RunIssue::new(
                    Stage::Barometric,
                    IssueKind::NoBaroOverlap,
                    format!("no shared barometric timestamps in {year}; offset set to 0"),
                ));
                0.0
            }
        };

        for sample in samples.iter_mut() {
            sample.pressure_kpa += offset_kpa;
        }
        corrected.extend(samples);

        offsets.push(YearOffset {
            year,
            offset_kpa,
            matched_timestamps: differences.len(),
            on_site_outliers: on_site_removed.get(&year).copied().unwrap_or(0),
            station_outliers: station_removed.get(&year).copied().unwrap_or(0),
        });
    }

    let station_year_set: BTreeSet<i32> = offsets.iter().map(|o| o.year).collect();
    for (year, samples) in on_site_years
        .iter()
        .filter(|(year, _)| !station_year_set.contains(year))
    {
        issues.record(RunIssue::new(
            Stage::Barometric,
            IssueKind::MissingBaroSource,
            format!("station record has no data in {year}; using the on-site barologger"),
        ));
        corrected.extend(samples.iter().cloned());
    }

    corrected.sort_by_key(|s| s.timestamp);
    (corrected, offsets)
}

/// Linear resampling onto a grid aligned to midnight. Grid points inside a gap longer than
/// `max_gap` are not produced.
pub fn resample(samples: &[BarometricSample], interval: Duration, max_gap: Duration) -> Vec<BaroPoint> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    if interval <= Duration::zero() {
        return Vec::new();
    }

    let midnight = first.timestamp.date().and_time(chrono::NaiveTime::MIN);
    let step = interval.num_seconds();
    let offset = (first.timestamp - midnight).num_seconds();
    let steps_to_first = (offset + step - 1) / step;
    let mut t = midnight + Duration::seconds(steps_to_first * step);

    let mut points = Vec::new();
    let mut idx = 0;
    while t <= last.timestamp {
        while idx + 1 < samples.len() && samples[idx + 1].timestamp <= t {
            idx += 1;
        }
        let before = &samples[idx];
        if before.timestamp == t {
            points.push(BaroPoint {
                timestamp: t,
                pressure_kpa: before.pressure_kpa,
            });
        } else if let Some(after) = samples.get(idx + 1) {
            let span = after.timestamp - before.timestamp;
            if span <= max_gap {
                let fraction = (t - before.timestamp).num_seconds() as f64 / span.num_seconds() as f64;
                points.push(BaroPoint {
                    timestamp: t,
                    pressure_kpa: before.pressure_kpa
                        + (after.pressure_kpa - before.pressure_kpa) * fraction,
                });
            }
        }
        t += interval;
    }
    points
}
