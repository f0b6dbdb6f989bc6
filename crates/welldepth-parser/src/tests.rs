use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::errors::ParserError;
use crate::formats::{SolinstExportParser, StationExportParser};
use crate::model::{well_id_from_filename, MeasurementUnit};
use crate::registry::LoggerParser;
use crate::{
    parse_field_notes, parse_logger_bytes, parse_logger_file, parse_manual_measurements,
    parse_well_dimensions, parse_well_elevations, parse_well_id_corrections, parse_well_id_list,
    ElevationKeys,
};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

#[test]
fn parses_solinst_levelogger_export() {
    let content = fixture("EWR-1_2018_0727_0824.csv");
    let parsed = parse_logger_file(&content).expect("levelogger parse failed");

    assert_eq!(parsed.format, "SOLINST_EXPORT");
    assert_eq!(parsed.header.value_unit, MeasurementUnit::Meters);
    assert_eq!(parsed.header.location.as_deref(), Some("EWR-1"));
    assert_eq!(parsed.header.serial_number.as_deref(), Some("2064235"));
    assert_eq!(parsed.header.project_id.as_deref(), Some("Sagehen Meadows"));
    assert_eq!(parsed.readings.len(), 6);

    let first = &parsed.readings[0];
    assert_eq!(first.timestamp, ts("2018-07-27 10:00:00"));
    assert!((first.value - 10.4512).abs() < 1e-12);
    assert_eq!(first.temperature, Some(21.112));
    assert_eq!(parsed.last_timestamp(), Some(ts("2018-07-27 10:50:00")));
}

#[test]
fn parses_solinst_barologger_in_kpa() {
    let content = fixture("baro_2018_0727.csv");
    let parsed = parse_logger_file(&content).expect("barologger parse failed");

    assert_eq!(parsed.header.value_unit, MeasurementUnit::KiloPascal);
    assert!(parsed.header.value_unit.is_pressure());
    assert_eq!(parsed.readings.len(), 3);
    assert_eq!(parsed.readings[2].timestamp, ts("2018-07-27 10:20:00"));
}

#[test]
fn latin1_degree_sign_does_not_break_parsing() {
    let content = fixture("baro_2018_0727.csv").replace('°', "\u{FFFD}");
    let mut bytes = Vec::new();
    for ch in content.chars() {
        if ch == '\u{FFFD}' {
            bytes.push(0xB0);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    let parsed = parse_logger_bytes(&bytes).expect("latin-1 export parse failed");
    assert_eq!(parsed.readings.len(), 3);
}

#[test]
fn station_export_falls_through_solinst_parser() {
    let content = fixture("station_sagehen_2018.csv");
    assert!(matches!(
        SolinstExportParser.parse(&content),
        Err(ParserError::FormatMismatch { .. })
    ));

    let parsed = parse_logger_file(&content).expect("station parse failed");
    assert_eq!(parsed.format, "STATION_EXPORT");
    assert_eq!(parsed.header.value_unit, MeasurementUnit::Millibar);
    // The 11:00 row has no pressure.
    assert_eq!(parsed.readings.len(), 2);
    assert_eq!(parsed.readings[1].timestamp, ts("2018-07-27 12:00:00"));
    assert_eq!(parsed.readings[1].temperature, Some(20.4));
}

#[test]
fn station_parser_accepts_split_date_and_time_columns() {
    let content = "date,time,pressure_kpa\n2019-05-01,08:00:00,80.1\n2019-05-01,09:00:00,80.2\n";
    let parsed = StationExportParser.parse(content).expect("split columns parse");
    assert_eq!(parsed.header.value_unit, MeasurementUnit::KiloPascal);
    assert_eq!(parsed.readings[0].timestamp, ts("2019-05-01 08:00:00"));
    assert!(parsed.readings[0].temperature.is_none());
}

#[test]
fn unknown_file_reports_every_attempt() {
    let err = parse_logger_file("a,b,c\n1,2,3\n").expect_err("garbage should not parse");
    match err {
        ParserError::NoMatchingParser { attempts } => {
            let names: Vec<_> = attempts.iter().map(|a| a.parser).collect();
            assert_eq!(names, vec!["SOLINST_EXPORT", "STATION_EXPORT"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn solinst_without_level_unit_is_a_mismatch() {
    let content = "Location:\nX\nDate,Time,ms,LEVEL,TEMPERATURE\n2018/07/27,10:00:00,0,1.0,5.0\n";
    assert!(matches!(
        SolinstExportParser.parse(content),
        Err(ParserError::FormatMismatch { .. })
    ));
}

#[test]
fn bad_level_value_is_a_row_error() {
    let content = "LEVEL\nUNIT: m\nDate,Time,ms,LEVEL,TEMPERATURE\n2018/07/27,10:00:00,0,abc,5.0\n";
    assert!(matches!(
        parse_logger_file(content),
        Err(ParserError::DataRow { line_index: 3, .. })
    ));
}

#[test]
fn well_id_comes_from_filename_prefix() {
    assert_eq!(well_id_from_filename("EWR-1_2018_0727_0824.csv"), Some("EWR-1"));
    assert_eq!(
        well_id_from_filename("raw/loggers/KWR-1_2019_0601_0630.csv"),
        Some("KWR-1")
    );
    assert_eq!(well_id_from_filename("notes.csv"), None);
}

#[test]
fn parses_field_notes() {
    let rows = parse_field_notes(&fixture("field_notes.csv")).expect("field notes");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].well_id, "EWR-1");
    assert_eq!(rows[0].start, ts("2018-07-27 10:05:00"));
    assert_eq!(rows[2].temp_threshold, 0.15);
}

#[test]
fn field_notes_require_threshold_column() {
    let err = parse_field_notes("well_id,start,end\nA,2018-01-01,2018-02-01\n")
        .expect_err("missing column");
    assert!(matches!(
        err,
        ParserError::MissingColumn {
            column: "temp_threshold",
            ..
        }
    ));
}

#[test]
fn parses_manual_measurements_with_unit_hint() {
    let table = parse_manual_measurements(&fixture("manual.csv")).expect("manual");
    assert_eq!(table.unit_hint, Some(MeasurementUnit::Centimeters));
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0].ground_to_water, Some(52.5));
    assert!(table.rows[0].water_present);
    assert_eq!(table.rows[1].ground_to_water, None);
    assert!(!table.rows[1].water_present);
}

#[test]
fn manual_measurements_default_to_water_present() {
    let table = parse_manual_measurements("well_id,timestamp,ground_to_water\nA,2020-06-01 08:00,0.4\n")
        .expect("manual");
    assert_eq!(table.unit_hint, None);
    assert!(table.rows[0].water_present);
}

#[test]
fn parses_well_dimensions_and_validity() {
    let rows = parse_well_dimensions(&fixture("well_dimensions.csv")).expect("dimensions");
    assert_eq!(rows.len(), 3);
    assert!(rows[0].valid);
    assert!(!rows[1].valid);
    assert_eq!(rows[2].well_depth_cm, Some(200.0));
    assert_eq!(rows[0].effective_timestamp, ts("2018-06-01 00:00:00"));
}

#[test]
fn parses_corrections_and_id_list() {
    let corrections =
        parse_well_id_corrections("well_field_id,well_id\nEWR1,EWR-1\n").expect("corrections");
    assert_eq!(corrections[0].well_field_id, "EWR1");
    assert_eq!(corrections[0].well_id, "EWR-1");

    let ids = parse_well_id_list("EWR-1\n\n# retired\nKET-1\n");
    assert_eq!(ids, vec!["EWR-1".to_string(), "KET-1".to_string()]);
}

#[test]
fn reads_elevation_from_property_or_point_z() {
    let wells = parse_well_elevations(&fixture("wells.geojson"), &ElevationKeys::default())
        .expect("elevations");
    assert_eq!(wells.len(), 2);
    assert_eq!(wells[0].well_id, "EWR-1");
    assert!((wells[0].elevation_m - 1941.2).abs() < 1e-9);
    assert_eq!(wells[1].well_id, "KET-1");
    assert!((wells[1].elevation_m - 1950.75).abs() < 1e-9);
}

#[test]
fn elevation_without_source_is_an_error() {
    let content = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"well_id":"A"},"geometry":{"type":"Point","coordinates":[0.0,0.0]}}]}"#;
    assert!(matches!(
        parse_well_elevations(content, &ElevationKeys::default()),
        Err(ParserError::GeoJson(_))
    ));
}
