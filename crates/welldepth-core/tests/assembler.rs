use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use welldepth_core::assembler::{assemble_daily, assemble_subdaily};
use welldepth_core::types::{DailySource, GroundReferencedSample, ManualMeasurement};

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 7, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn sample(well: &str, ts: NaiveDateTime, depth: f64) -> GroundReferencedSample {
    GroundReferencedSample {
        well_id: well.to_string(),
        timestamp: ts,
        deployment_id: 0,
        ground_to_water_depth_m: depth,
        raw_level_m: 9.0,
        baro_level_m: Some(8.0),
        compensated_level_m: 1.0,
        temperature: Some(10.0),
    }
}

#[test]
fn subdaily_ordered_by_time_then_well() {
    let ordered = assemble_subdaily(vec![
        sample("KET-1", at(27, 10, 0), 0.1),
        sample("EWR-1", at(27, 10, 10), 0.2),
        sample("EWR-1", at(27, 10, 0), 0.3),
    ]);
    let keys: Vec<(NaiveDateTime, &str)> = ordered
        .iter()
        .map(|s| (s.timestamp, s.well_id.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (at(27, 10, 0), "EWR-1"),
            (at(27, 10, 0), "KET-1"),
            (at(27, 10, 10), "EWR-1"),
        ]
    );
}

#[test]
fn daily_picks_sample_nearest_reference_time_and_fills_with_manual() {
    let subdaily = vec![
        sample("EWR-1", at(27, 7, 50), 0.40),
        sample("EWR-1", at(27, 8, 10), 0.41),
        sample("EWR-1", at(27, 9, 0), 0.42),
        sample("EWR-1", at(28, 13, 0), 0.45),
    ];
    let manual = vec![
        ManualMeasurement {
            well_id: "EWR-1".to_string(),
            timestamp: at(27, 10, 30),
            ground_to_water_m: Some(0.525),
            water_present: true,
        },
        ManualMeasurement {
            well_id: "EWR-1".to_string(),
            timestamp: at(30, 9, 45),
            ground_to_water_m: Some(0.6),
            water_present: true,
        },
        ManualMeasurement {
            well_id: "EWR-1".to_string(),
            timestamp: at(31, 9, 45),
            ground_to_water_m: None,
            water_present: false,
        },
    ];

    let daily = assemble_daily(&subdaily, &manual, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

    assert_eq!(daily.len(), 3);
    // 07:50 and 08:10 tie; the earlier one wins.
    assert_eq!(daily[0].timestamp, at(27, 7, 50));
    assert_eq!(daily[0].source, DailySource::Logger);
    assert_eq!(daily[1].timestamp, at(28, 13, 0));
    assert_eq!(daily[2].timestamp, at(30, 9, 45));
    assert_eq!(daily[2].source, DailySource::Manual);
    assert_eq!(daily[2].ground_to_water_depth_m, 0.6);
}
