use chrono::{Duration, NaiveDate, NaiveDateTime};
use welldepth_core::barometric::{normalize, resample};
use welldepth_core::config::PipelineConfig;
use welldepth_core::report::{IssueKind, IssueLog};
use welldepth_core::types::{BaroSource, BarometricSample};

fn at(year: i32, minute: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 7, 27)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(minute)
}

fn baro(source: BaroSource, timestamp: NaiveDateTime, pressure_kpa: f64) -> BarometricSample {
    BarometricSample {
        timestamp,
        pressure_kpa,
        temperature: None,
        source,
        elevation_m: 0.0,
    }
}

fn series(source: BaroSource, year: i32, step: i64, values: &[f64]) -> Vec<BarometricSample> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| baro(source, at(year, step * i as i64), *value))
        .collect()
}

fn drifting(n: usize, base: f64) -> Vec<f64> {
    (0..n).map(|i| base + 0.01 * i as f64).collect()
}

#[test]
fn station_is_shifted_onto_on_site_barologger() {
    let on_site = series(BaroSource::OnSite, 2018, 10, &drifting(12, 80.5));
    let station = series(BaroSource::RemoteStation, 2018, 10, &drifting(12, 80.0));
    let mut issues = IssueLog::new();

    let normalized = normalize(on_site.clone(), station, &PipelineConfig::default(), &mut issues)
        .expect("normalized series");

    assert!(issues.is_empty());
    assert_eq!(normalized.interval, Duration::minutes(10));
    assert_eq!(normalized.offsets.len(), 1);
    assert_eq!(normalized.offsets[0].year, 2018);
    assert_eq!(normalized.offsets[0].matched_timestamps, 12);
    assert!((normalized.offsets[0].offset_kpa - 0.5).abs() < 1e-9);

    assert_eq!(normalized.points.len(), 12);
    for (point, expected) in normalized.points.iter().zip(&on_site) {
        assert_eq!(point.timestamp, expected.timestamp);
        assert!((point.pressure_kpa - expected.pressure_kpa).abs() < 1e-9);
    }
}

#[test]
fn outliers_are_removed_before_offsets() {
    let on_site = series(BaroSource::OnSite, 2018, 10, &drifting(12, 80.5));
    let mut station_values = drifting(12, 80.0);
    station_values[5] = 120.0;
    let station = series(BaroSource::RemoteStation, 2018, 10, &station_values);
    let mut issues = IssueLog::new();

    let normalized = normalize(on_site, station, &PipelineConfig::default(), &mut issues).unwrap();
    let offset = &normalized.offsets[0];
    assert_eq!(offset.station_outliers, 1);
    assert_eq!(offset.matched_timestamps, 11);
    assert!((offset.offset_kpa - 0.5).abs() < 1e-9);
    // The removed 00:50 reading is filled from its neighbours.
    let filled = normalized.points.iter().find(|p| p.timestamp == at(2018, 50)).unwrap();
    assert!((filled.pressure_kpa - 80.55).abs() < 1e-9);
}

#[test]
fn year_without_overlap_gets_zero_offset() {
    let on_site = series(BaroSource::OnSite, 2018, 10, &drifting(6, 80.5));
    let station = series(BaroSource::RemoteStation, 2019, 10, &drifting(6, 80.0));
    let mut issues = IssueLog::new();

    let normalized = normalize(on_site, station, &PipelineConfig::default(), &mut issues).unwrap();

    let offset_2019 = normalized.offsets.iter().find(|o| o.year == 2019).unwrap();
    assert_eq!(offset_2019.offset_kpa, 0.0);
    assert_eq!(offset_2019.matched_timestamps, 0);
    assert_eq!(issues.count(IssueKind::NoBaroOverlap), 1);
    // 2018 only exists on site, so the barologger covers it directly.
    assert_eq!(issues.count(IssueKind::MissingBaroSource), 1);
    assert!(normalized.points.iter().any(|p| p.timestamp == at(2018, 0)));
    assert!(normalized.points.iter().any(|p| p.timestamp == at(2019, 0)));
}

#[test]
fn single_source_is_used_alone() {
    let station = series(BaroSource::RemoteStation, 2018, 60, &drifting(4, 80.0));
    let mut issues = IssueLog::new();

    let normalized = normalize(Vec::new(), station, &PipelineConfig::default(), &mut issues).unwrap();

    assert_eq!(issues.count(IssueKind::MissingBaroSource), 1);
    assert!(normalized.offsets.is_empty());
    assert_eq!(normalized.interval, Duration::minutes(60));
    assert_eq!(normalized.points.len(), 4);

    let mut issues = IssueLog::new();
    assert!(normalize(Vec::new(), Vec::new(), &PipelineConfig::default(), &mut issues).is_none());
}

#[test]
fn sources_are_moved_to_reference_elevation() {
    let mut on_site = series(BaroSource::OnSite, 2018, 10, &drifting(6, 80.0));
    for sample in on_site.iter_mut() {
        sample.elevation_m = 1941.2;
    }
    let mut issues = IssueLog::new();
    let normalized = normalize(on_site, Vec::new(), &PipelineConfig::default(), &mut issues).unwrap();
    assert_eq!(normalized.reference_elevation_m, 0.0);
    assert!(normalized.points[0].pressure_kpa > 95.0);
}

#[test]
fn resample_aligns_to_midnight_and_respects_gaps() {
    let samples = vec![
        baro(BaroSource::RemoteStation, at(2018, 10 * 60 + 7), 80.0),
        baro(BaroSource::RemoteStation, at(2018, 11 * 60 + 7), 81.0),
        baro(BaroSource::RemoteStation, at(2018, 16 * 60), 82.0),
    ];

    let points = resample(&samples, Duration::minutes(30), Duration::minutes(180));
    let stamps: Vec<NaiveDateTime> = points.iter().map(|p| p.timestamp).collect();

    assert_eq!(
        stamps,
        vec![at(2018, 10 * 60 + 30), at(2018, 11 * 60), at(2018, 16 * 60)]
    );
    let expected = 80.0 + 23.0 / 60.0;
    assert!((points[0].pressure_kpa - expected).abs() < 1e-9);
    assert_eq!(points[2].pressure_kpa, 82.0);
}
