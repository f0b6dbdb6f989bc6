use chrono::{Duration, NaiveDate, NaiveDateTime};
use welldepth_core::segmenter::{deployment_ids, segment};
use welldepth_core::types::SensorSample;

fn ts(minute: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 7, 27)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
        + Duration::minutes(minute)
}

fn sample(minute: i64) -> SensorSample {
    SensorSample {
        well_id: "EWR-1".to_string(),
        timestamp: ts(minute),
        level_m: 1.0,
        temperature: Some(9.0),
    }
}

#[test]
fn break_follows_irregular_gap() {
    // Intervals 10, 10, 10, 25, 10 after the first sample.
    let stamps: Vec<NaiveDateTime> = [0, 10, 20, 30, 55, 65].into_iter().map(ts).collect();
    assert_eq!(
        deployment_ids(&stamps, Duration::minutes(10)),
        vec![0, 0, 0, 0, 1, 1]
    );
}

#[test]
fn every_off_interval_gap_opens_a_deployment() {
    let stamps: Vec<NaiveDateTime> = [0, 10, 15, 25, 100].into_iter().map(ts).collect();
    assert_eq!(
        deployment_ids(&stamps, Duration::minutes(10)),
        vec![0, 0, 1, 1, 2]
    );
    assert!(deployment_ids::<NaiveDateTime>(&[], Duration::minutes(10)).is_empty());
}

#[test]
fn segment_groups_samples() {
    let samples: Vec<SensorSample> = [0, 10, 20, 60, 70].into_iter().map(sample).collect();
    let deployments = segment("EWR-1", samples, Duration::minutes(10));

    assert_eq!(deployments.len(), 2);
    assert_eq!(deployments[0].deployment_id, 0);
    assert_eq!(deployments[0].samples.len(), 3);
    assert_eq!(deployments[1].deployment_id, 1);
    assert_eq!(deployments[1].start(), Some(ts(60)));
    assert_eq!(deployments[1].end(), Some(ts(70)));
    assert_eq!(deployments[1].well_id, "EWR-1");
}
