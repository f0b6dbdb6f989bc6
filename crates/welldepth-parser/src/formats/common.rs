use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::errors::ParserError;

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

static DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%m/%d/%Y"];

static TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M:%S%.f %p",
    "%I:%M %p",
];

pub(crate) fn parse_datetime_str(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    // Date-only values mean midnight.
    parse_date_str(trimmed).and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub(crate) fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub(crate) fn parse_time_str(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
}

pub(crate) fn parse_timestamp(
    parser: &'static str,
    value: &str,
    line_index: usize,
) -> Result<NaiveDateTime, ParserError> {
    parse_datetime_str(value).ok_or_else(|| ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid timestamp '{}'", value.trim()),
    })
}

pub(crate) fn parse_date_time(
    parser: &'static str,
    date: &str,
    time: &str,
    line_index: usize,
) -> Result<NaiveDateTime, ParserError> {
    let date_value = parse_date_str(date).ok_or_else(|| ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid date '{}'", date.trim()),
    })?;
    let time_value = parse_time_str(time).ok_or_else(|| ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid time '{}'", time.trim()),
    })?;
    Ok(date_value.and_time(time_value))
}

pub(crate) fn parse_required_f64(
    parser: &'static str,
    value: Option<&str>,
    line_index: usize,
    column: &str,
) -> Result<f64, ParserError> {
    parse_optional_f64(parser, value, line_index, column)?.ok_or_else(|| ParserError::DataRow {
        parser,
        line_index,
        message: format!("missing value for column '{column}'"),
    })
}

pub(crate) fn parse_optional_f64(
    parser: &'static str,
    value: Option<&str>,
    line_index: usize,
    column: &str,
) -> Result<Option<f64>, ParserError> {
    let Some(raw) = value.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|err| ParserError::DataRow {
            parser,
            line_index,
            message: format!("invalid number '{raw}' in column '{column}': {err}"),
        })
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn read_records(
    parser: &'static str,
    content: &str,
) -> Result<Vec<StringRecord>, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ParserError::Csv { parser, source })
}

pub(crate) fn normalize_column(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Position of a header among `names`, matched after normalization.
pub(crate) fn find_column(header: &StringRecord, names: &[&str]) -> Option<usize> {
    header
        .iter()
        .map(normalize_column)
        .position(|col| names.iter().any(|name| col == *name))
}

pub(crate) fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}
