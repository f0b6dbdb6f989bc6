use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::types::SensorSample;

/// Field-note record of when a logger was in a well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWindow {
    pub well_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Temperature change per minute that marks the logger entering or leaving water.
    pub temp_threshold: f64,
}

#[derive(Debug)]
pub enum WindowMatch<'a> {
    /// The well has no field notes at all.
    MissingWell,
    NoMatch,
    Unique(&'a FieldWindow),
    Ambiguous(Vec<&'a FieldWindow>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimReport {
    pub well_id: String,
    pub source: String,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub samples_in: usize,
    pub samples_in_window: usize,
    pub front_cutoff: usize,
    pub back_cutoff: usize,
    pub samples_out: usize,
}

/// Windows of `well_id` that fall inside the file's time span widened by `buffer`.
pub fn match_window<'a>(
    windows: &'a [FieldWindow],
    well_id: &str,
    first: NaiveDateTime,
    last: NaiveDateTime,
    buffer: Duration,
) -> WindowMatch<'a> {
    let for_well: Vec<&FieldWindow> = windows.iter().filter(|w| w.well_id == well_id).collect();
    if for_well.is_empty() {
        return WindowMatch::MissingWell;
    }

    let mut matched: Vec<&FieldWindow> = for_well
        .into_iter()
        .filter(|w| w.start >= first - buffer && w.end <= last + buffer)
        .collect();

    match matched.len() {
        0 => WindowMatch::NoMatch,
        1 => WindowMatch::Unique(matched.remove(0)),
        _ => WindowMatch::Ambiguous(matched),
    }
}

/// Absolute temperature change per minute from each sample to the next; the last sample gets 0.
/// A missing temperature on either side counts as no change.
pub fn temperature_rates(samples: &[SensorSample]) -> Vec<f64> {
    let mut rates: Vec<f64> = samples
        .windows(2)
        .map(|pair| {
            let minutes = (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64 / 60.0;
            match (pair[0].temperature, pair[1].temperature) {
                (Some(a), Some(b)) if minutes > 0.0 => (b - a).abs() / minutes,
                _ => 0.0,
            }
        })
        .collect();
    if !samples.is_empty() {
        rates.push(0.0);
    }
    rates
}

/// Drops samples logged while the sensor was out of the water.
///
/// Samples are first restricted to the field-note window widened by `buffer`, then the series
/// is halved. The front half is cut before its last sample whose temperature rate meets the
/// threshold; the back half is cut after its first such sample. Both matching samples are kept.
pub fn trim_edges(
    samples: &[SensorSample],
    window: &FieldWindow,
    buffer: Duration,
    source: &str,
) -> (Vec<SensorSample>, TrimReport) {
    let lower = window.start - buffer;
    let upper = window.end + buffer;
    let mut restricted: Vec<SensorSample> = samples
        .iter()
        .filter(|s| s.timestamp >= lower && s.timestamp <= upper)
        .cloned()
        .collect();
    restricted.sort_by_key(|s| s.timestamp);

    let rates = temperature_rates(&restricted);
    let mid = restricted.len() / 2;
    let over = |idx: &usize| rates[*idx] >= window.temp_threshold;

    let front_start = (0..mid).rev().find(over).unwrap_or(0);
    let back_end = (mid..restricted.len())
        .find(over)
        .map(|idx| idx + 1)
        .unwrap_or(restricted.len());

    let report = TrimReport {
        well_id: window.well_id.clone(),
        source: source.to_string(),
        window_start: window.start,
        window_end: window.end,
        samples_in: samples.len(),
        samples_in_window: restricted.len(),
        front_cutoff: front_start,
        back_cutoff: restricted.len() - back_end,
        samples_out: back_end - front_start,
    };

    debug!(
        well_id = %report.well_id,
        source,
        front_cutoff = report.front_cutoff,
        back_cutoff = report.back_cutoff,
        kept = report.samples_out,
        "trimmed deployment edges"
    );

    let trimmed = restricted.drain(front_start..back_end).collect();
    (trimmed, report)
}
