use chrono::{Duration, NaiveDate, NaiveDateTime};
use welldepth_core::edge_trimmer::{
    match_window, temperature_rates, trim_edges, FieldWindow, WindowMatch,
};
use welldepth_core::types::SensorSample;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 7, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn series(start: NaiveDateTime, temps: &[f64]) -> Vec<SensorSample> {
    temps
        .iter()
        .enumerate()
        .map(|(i, temp)| SensorSample {
            well_id: "EWR-1".to_string(),
            timestamp: start + Duration::minutes(10 * i as i64),
            level_m: 1.0 + i as f64 * 0.001,
            temperature: Some(*temp),
        })
        .collect()
}

fn window(start: NaiveDateTime, end: NaiveDateTime) -> FieldWindow {
    FieldWindow {
        well_id: "EWR-1".to_string(),
        start,
        end,
        temp_threshold: 0.2,
    }
}

#[test]
fn rates_are_forward_differences_per_minute() {
    let samples = series(at(27, 10, 0), &[20.0, 10.0, 10.5]);
    let rates = temperature_rates(&samples);
    assert_eq!(rates.len(), 3);
    assert!((rates[0] - 1.0).abs() < 1e-12);
    assert!((rates[1] - 0.05).abs() < 1e-12);
    assert_eq!(rates[2], 0.0);
}

#[test]
fn trims_both_edges_at_temperature_swings() {
    // 09:00 through 13:00; the window plus buffer keeps 09:50 through 12:10.
    let mut temps = vec![25.0; 5];
    temps.extend([20.0, 19.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 18.0, 19.0]);
    temps.extend(vec![25.0; 5]);
    let samples = series(at(27, 9, 0), &temps);
    let window = window(at(27, 10, 0), at(27, 12, 0));

    let (kept, report) = trim_edges(&samples, &window, Duration::minutes(10), "EWR-1_2018_0727.csv");

    assert_eq!(report.samples_in, 25);
    assert_eq!(report.samples_in_window, 15);
    // 09:50 goes; 10:00 is the last fast change in the front half and stays.
    assert_eq!(report.front_cutoff, 1);
    // 11:50 is the first fast change in the back half and stays; 12:00 and 12:10 go.
    assert_eq!(report.back_cutoff, 2);
    assert_eq!(report.samples_out, 12);
    assert_eq!(kept.len(), 12);
    assert_eq!(kept.first().unwrap().timestamp, at(27, 10, 0));
    assert_eq!(kept.last().unwrap().timestamp, at(27, 11, 50));
}

#[test]
fn steady_temperature_keeps_window() {
    let samples = series(at(27, 10, 0), &[10.0; 12]);
    let window = window(at(27, 10, 0), at(27, 11, 50));
    let (kept, report) = trim_edges(&samples, &window, Duration::minutes(10), "steady");
    assert_eq!(kept.len(), 12);
    assert_eq!(report.front_cutoff, 0);
    assert_eq!(report.back_cutoff, 0);
}

#[test]
fn window_matching_outcomes() {
    let windows = vec![
        window(at(27, 10, 5), NaiveDate::from_ymd_opt(2018, 8, 24).unwrap().and_hms_opt(14, 0, 0).unwrap()),
        FieldWindow {
            start: NaiveDate::from_ymd_opt(2018, 8, 24).unwrap().and_hms_opt(14, 30, 0).unwrap(),
            end: NaiveDate::from_ymd_opt(2018, 9, 21).unwrap().and_hms_opt(11, 0, 0).unwrap(),
            ..window(at(27, 0, 0), at(27, 0, 0))
        },
    ];
    let buffer = Duration::hours(8);
    let first_file_end = NaiveDate::from_ymd_opt(2018, 8, 24).unwrap().and_hms_opt(14, 10, 0).unwrap();

    match match_window(&windows, "EWR-1", at(27, 10, 0), first_file_end, buffer) {
        WindowMatch::Unique(found) => assert_eq!(found.start, at(27, 10, 5)),
        other => panic!("expected a unique window, got {other:?}"),
    }

    assert!(matches!(
        match_window(&windows, "KET-1", at(27, 10, 0), first_file_end, buffer),
        WindowMatch::MissingWell
    ));

    let late = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert!(matches!(
        match_window(&windows, "EWR-1", late, late + Duration::days(10), buffer),
        WindowMatch::NoMatch
    ));

    let whole_season_end = NaiveDate::from_ymd_opt(2018, 9, 21).unwrap().and_hms_opt(12, 0, 0).unwrap();
    match match_window(&windows, "EWR-1", at(27, 9, 0), whole_season_end, buffer) {
        WindowMatch::Ambiguous(found) => assert_eq!(found.len(), 2),
        other => panic!("expected an ambiguous match, got {other:?}"),
    }
}
