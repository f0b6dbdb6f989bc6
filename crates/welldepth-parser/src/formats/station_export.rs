use csv::StringRecord;

use crate::errors::ParserError;
use crate::model::{LoggerHeader, LoggerReading, MeasurementUnit, ParsedLoggerFile};
use crate::registry::LoggerParser;

use super::{
    find_column, is_blank, normalize_column, parse_date_time, parse_optional_f64,
    parse_timestamp, read_records,
};

/// Weather-station export: one header row naming a timestamp column (or `date` + `time`)
/// and a pressure column whose name carries its unit, e.g. `Barometric Pressure (mb)`.
pub struct StationExportParser;

impl Default for StationExportParser {
    fn default() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy)]
enum TimeColumns {
    Combined(usize),
    Split { date: usize, time: usize },
}

#[derive(Debug, Clone, Copy)]
struct StationLayout {
    time: TimeColumns,
    pressure: usize,
    unit: MeasurementUnit,
    temperature: Option<usize>,
}

impl StationExportParser {
    const NAME: &'static str = "STATION_EXPORT";
    const MAX_PREAMBLE_ROWS: usize = 20;

    fn classify(header: &StringRecord) -> Option<StationLayout> {
        let time = match find_column(header, &["timestamp", "datetime", "date_time"]) {
            Some(idx) => TimeColumns::Combined(idx),
            None => TimeColumns::Split {
                date: find_column(header, &["date"])?,
                time: find_column(header, &["time"])?,
            },
        };

        let (pressure, unit) = header.iter().enumerate().find_map(|(idx, name)| {
            let normalized = normalize_column(name);
            if !(normalized.contains("pressure") || normalized.contains("baro")) {
                return None;
            }
            Self::unit_from_tokens(&normalized).map(|unit| (idx, unit))
        })?;

        let temperature = header
            .iter()
            .position(|name| normalize_column(name).contains("temp"));

        Some(StationLayout {
            time,
            pressure,
            unit,
            temperature,
        })
    }

    fn unit_from_tokens(normalized: &str) -> Option<MeasurementUnit> {
        normalized.split('_').find_map(|token| match token {
            "mbar" | "mb" | "hpa" | "millibar" => Some(MeasurementUnit::Millibar),
            "kpa" => Some(MeasurementUnit::KiloPascal),
            "inhg" => Some(MeasurementUnit::InchesMercury),
            _ => None,
        })
    }
}

impl LoggerParser for StationExportParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError> {
        let records = read_records(Self::NAME, content)?;

        let (header_idx, layout) = records
            .iter()
            .take(Self::MAX_PREAMBLE_ROWS)
            .enumerate()
            .filter(|(_, record)| !record.get(0).unwrap_or_default().starts_with('#'))
            .find_map(|(idx, record)| Self::classify(record).map(|layout| (idx, layout)))
            .ok_or_else(|| ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "no header row with a timestamp and a unit-bearing pressure column"
                    .to_string(),
            })?;

        let mut readings = Vec::new();
        for (offset, record) in records[header_idx + 1..].iter().enumerate() {
            let line_index = header_idx + offset + 1;
            if is_blank(record) || record.get(0).unwrap_or_default().starts_with('#') {
                continue;
            }

            let timestamp = match layout.time {
                TimeColumns::Combined(idx) => {
                    parse_timestamp(Self::NAME, record.get(idx).unwrap_or_default(), line_index)?
                }
                TimeColumns::Split { date, time } => parse_date_time(
                    Self::NAME,
                    record.get(date).unwrap_or_default(),
                    record.get(time).unwrap_or_default(),
                    line_index,
                )?,
            };

            // Stations leave gaps as blank cells; those rows carry no pressure.
            let Some(value) =
                parse_optional_f64(Self::NAME, record.get(layout.pressure), line_index, "pressure")?
            else {
                continue;
            };
            let temperature = match layout.temperature {
                Some(idx) => parse_optional_f64(Self::NAME, record.get(idx), line_index, "temperature")?,
                None => None,
            };

            readings.push(LoggerReading {
                timestamp,
                value,
                temperature,
            });
        }

        if readings.is_empty() {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(ParsedLoggerFile {
            format: Self::NAME,
            header: LoggerHeader::with_unit(layout.unit),
            readings,
        })
    }
}
