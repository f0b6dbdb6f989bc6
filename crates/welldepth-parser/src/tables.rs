use csv::StringRecord;

use crate::errors::ParserError;
use crate::formats::{
    find_column, is_blank, parse_bool, parse_optional_f64, parse_required_f64, parse_timestamp,
    read_records,
};
use crate::model::{
    FieldNoteRow, ManualRow, MeasurementUnit, WellDimensionRow, WellIdCorrectionRow,
};

const FIELD_NOTES: &str = "FIELD_NOTES";
const MANUAL: &str = "MANUAL_MEASUREMENTS";
const WELL_DIMENSIONS: &str = "WELL_DIMENSIONS";
const WELL_ID_CORRECTIONS: &str = "WELL_ID_CORRECTIONS";

/// Manual readings plus the unit named by the depth column header, if any.
#[derive(Debug, Clone)]
pub struct ManualTable {
    pub unit_hint: Option<MeasurementUnit>,
    pub rows: Vec<ManualRow>,
}

struct Table {
    name: &'static str,
    header: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(name: &'static str, content: &str) -> Result<Self, ParserError> {
        let mut records = read_records(name, content)?.into_iter();
        let header = records
            .next()
            .ok_or(ParserError::EmptyData { parser: name })?;
        let rows = records.filter(|record| !is_blank(record)).collect();
        Ok(Self { name, header, rows })
    }

    fn required(&self, column: &'static str, aliases: &[&str]) -> Result<usize, ParserError> {
        find_column(&self.header, aliases).ok_or(ParserError::MissingColumn {
            table: self.name,
            column,
        })
    }

    fn optional(&self, aliases: &[&str]) -> Option<usize> {
        find_column(&self.header, aliases)
    }

    /// Line index as seen in the file (header is line 0).
    fn rows(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
        self.rows.iter().enumerate().map(|(idx, row)| (idx + 1, row))
    }

    fn text<'a>(&self, row: &'a StringRecord, idx: usize, line_index: usize) -> Result<&'a str, ParserError> {
        match row.get(idx).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ParserError::DataRow {
                parser: self.name,
                line_index,
                message: format!("missing value in column {idx}"),
            }),
        }
    }
}

pub fn parse_field_notes(content: &str) -> Result<Vec<FieldNoteRow>, ParserError> {
    let table = Table::read(FIELD_NOTES, content)?;
    let well_idx = table.required("well_id", &["well_id"])?;
    let start_idx = table.required("start", &["start", "start_time"])?;
    let end_idx = table.required("end", &["end", "end_time"])?;
    let threshold_idx = table.required("temp_threshold", &["temp_threshold", "temperature_threshold"])?;

    table
        .rows()
        .map(|(line_index, row)| {
            Ok(FieldNoteRow {
                well_id: table.text(row, well_idx, line_index)?.to_string(),
                start: parse_timestamp(FIELD_NOTES, table.text(row, start_idx, line_index)?, line_index)?,
                end: parse_timestamp(FIELD_NOTES, table.text(row, end_idx, line_index)?, line_index)?,
                temp_threshold: parse_required_f64(
                    FIELD_NOTES,
                    row.get(threshold_idx),
                    line_index,
                    "temp_threshold",
                )?,
            })
        })
        .collect()
}

pub fn parse_manual_measurements(content: &str) -> Result<ManualTable, ParserError> {
    let table = Table::read(MANUAL, content)?;
    let well_idx = table.required("well_id", &["well_id"])?;
    let ts_idx = table.required("timestamp", &["timestamp", "datetime"])?;

    let (depth_idx, unit_hint) = if let Some(idx) = table.optional(&["ground_to_water_cm"]) {
        (idx, Some(MeasurementUnit::Centimeters))
    } else if let Some(idx) = table.optional(&["ground_to_water_m"]) {
        (idx, Some(MeasurementUnit::Meters))
    } else {
        (
            table.required("ground_to_water", &["ground_to_water", "ground_to_water_depth"])?,
            None,
        )
    };
    let water_idx = table.optional(&["water_present", "water_binary"]);

    let rows = table
        .rows()
        .map(|(line_index, row)| {
            let water_present = match water_idx.and_then(|idx| row.get(idx)) {
                Some(raw) if !raw.trim().is_empty() => {
                    parse_bool(raw).ok_or_else(|| ParserError::DataRow {
                        parser: MANUAL,
                        line_index,
                        message: format!("invalid boolean '{}' for water_present", raw.trim()),
                    })?
                }
                _ => true,
            };
            Ok(ManualRow {
                well_id: table.text(row, well_idx, line_index)?.to_string(),
                timestamp: parse_timestamp(MANUAL, table.text(row, ts_idx, line_index)?, line_index)?,
                ground_to_water: parse_optional_f64(MANUAL, row.get(depth_idx), line_index, "ground_to_water")?,
                water_present,
            })
        })
        .collect::<Result<Vec<_>, ParserError>>()?;

    Ok(ManualTable { unit_hint, rows })
}

pub fn parse_well_dimensions(content: &str) -> Result<Vec<WellDimensionRow>, ParserError> {
    let table = Table::read(WELL_DIMENSIONS, content)?;
    let well_idx = table.required("well_id", &["well_id"])?;
    let ts_idx = table.required("effective_timestamp", &["effective_timestamp", "timestamp"])?;
    let depth_idx = table.required("well_depth_cm", &["well_depth_cm"])?;
    let valid_idx = table.optional(&["valid"]);

    table
        .rows()
        .map(|(line_index, row)| {
            let valid = valid_idx
                .and_then(|idx| row.get(idx))
                .and_then(parse_bool)
                .unwrap_or(true);
            Ok(WellDimensionRow {
                well_id: table.text(row, well_idx, line_index)?.to_string(),
                effective_timestamp: parse_timestamp(
                    WELL_DIMENSIONS,
                    table.text(row, ts_idx, line_index)?,
                    line_index,
                )?,
                well_depth_cm: parse_optional_f64(WELL_DIMENSIONS, row.get(depth_idx), line_index, "well_depth_cm")?,
                valid,
            })
        })
        .collect()
}

pub fn parse_well_id_corrections(content: &str) -> Result<Vec<WellIdCorrectionRow>, ParserError> {
    let table = Table::read(WELL_ID_CORRECTIONS, content)?;
    let field_idx = table.required("well_field_id", &["well_field_id", "original_well_id"])?;
    let well_idx = table.required("well_id", &["well_id", "analysis_well_id"])?;

    table
        .rows()
        .map(|(line_index, row)| {
            Ok(WellIdCorrectionRow {
                well_field_id: table.text(row, field_idx, line_index)?.to_string(),
                well_id: table.text(row, well_idx, line_index)?.to_string(),
            })
        })
        .collect()
}

/// One well id per line; blank lines and `#` comments are ignored.
pub fn parse_well_id_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
