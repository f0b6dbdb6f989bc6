use chrono::Duration;

use crate::errors::ParserError;
use crate::model::{LoggerHeader, LoggerReading, MeasurementUnit, ParsedLoggerFile};
use crate::registry::LoggerParser;

use super::{
    find_column, is_blank, normalize_column, parse_date_time, parse_optional_f64,
    parse_required_f64, read_records,
};

/// Solinst Levelogger/Barologger CSV export: a free-form header block followed by a
/// `Date,Time,ms,LEVEL,TEMPERATURE` table.
pub struct SolinstExportParser;

impl Default for SolinstExportParser {
    fn default() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    SerialNumber,
    ProjectId,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Level,
    Temperature,
}

impl SolinstExportParser {
    const NAME: &'static str = "SOLINST_EXPORT";

    fn is_data_header(line: &str) -> bool {
        let columns: Vec<String> = line.split(',').map(normalize_column).collect();
        let has = |name: &str| columns.iter().any(|col| col == name);
        has("date") && has("time") && has("level")
    }

    fn parse_header_block(lines: &[&str]) -> Result<LoggerHeader, ParserError> {
        let mut serial_number = None;
        let mut project_id = None;
        let mut location = None;
        let mut level_unit: Option<MeasurementUnit> = None;
        let mut temperature_unit = None;

        let mut pending: Option<HeaderField> = None;
        let mut channel: Option<Channel> = None;

        for (row_index, raw) in lines.iter().enumerate() {
            let line = raw.trim().trim_matches(',').trim();
            if line.is_empty() {
                continue;
            }

            if let Some(field) = pending.take() {
                if !line.contains(':') {
                    let value = Some(line.to_string());
                    match field {
                        HeaderField::SerialNumber => serial_number = value,
                        HeaderField::ProjectId => project_id = value,
                        HeaderField::Location => location = value,
                    }
                    continue;
                }
            }

            if let Some((label, value)) = line.split_once(':') {
                let label = normalize_column(label);
                let value = value.trim();
                let field = match label.as_str() {
                    "serial_number" => Some(HeaderField::SerialNumber),
                    "project_id" => Some(HeaderField::ProjectId),
                    "location" => Some(HeaderField::Location),
                    "unit" => {
                        match channel {
                            Some(Channel::Level) => {
                                let unit = MeasurementUnit::try_from(value).map_err(|message| {
                                    ParserError::InvalidHeader {
                                        parser: Self::NAME,
                                        row_index,
                                        message,
                                    }
                                })?;
                                level_unit = Some(unit);
                            }
                            Some(Channel::Temperature) => {
                                temperature_unit = Some(value.to_string());
                            }
                            None => {}
                        }
                        None
                    }
                    _ => None,
                };

                if let Some(field) = field {
                    if value.is_empty() {
                        pending = Some(field);
                    } else {
                        let value = Some(value.to_string());
                        match field {
                            HeaderField::SerialNumber => serial_number = value,
                            HeaderField::ProjectId => project_id = value,
                            HeaderField::Location => location = value,
                        }
                    }
                }
                continue;
            }

            match normalize_column(line).as_str() {
                "level" => channel = Some(Channel::Level),
                "temperature" => channel = Some(Channel::Temperature),
                _ => {}
            }
        }

        let value_unit = level_unit.ok_or_else(|| ParserError::FormatMismatch {
            parser: Self::NAME,
            reason: "header block does not declare a UNIT for the LEVEL channel".to_string(),
        })?;

        Ok(LoggerHeader {
            serial_number,
            project_id,
            location,
            value_unit,
            temperature_unit,
        })
    }
}

impl LoggerParser for SolinstExportParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError> {
        let lines: Vec<&str> = content.lines().collect();
        let header_idx = lines
            .iter()
            .position(|line| Self::is_data_header(line))
            .ok_or_else(|| ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "no Date,Time,LEVEL data header row".to_string(),
            })?;

        let header = Self::parse_header_block(&lines[..header_idx])?;

        let table = lines[header_idx..].join("\n");
        let records = read_records(Self::NAME, &table)?;
        let Some((columns, rows)) = records.split_first() else {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        };

        let missing = |name: &str| ParserError::InvalidHeader {
            parser: Self::NAME,
            row_index: header_idx,
            message: format!("missing {name} column"),
        };
        let date_idx = find_column(columns, &["date"]).ok_or_else(|| missing("Date"))?;
        let time_idx = find_column(columns, &["time"]).ok_or_else(|| missing("Time"))?;
        let level_idx = find_column(columns, &["level"]).ok_or_else(|| missing("LEVEL"))?;
        let ms_idx = find_column(columns, &["ms"]);
        let temp_idx = find_column(columns, &["temperature", "temp"]);

        let mut readings = Vec::with_capacity(rows.len());
        for (offset, record) in rows.iter().enumerate() {
            let line_index = header_idx + offset + 1;
            if is_blank(record) {
                continue;
            }
            let first = record.get(0).unwrap_or_default();
            if first.eq_ignore_ascii_case("end") || record.len() <= level_idx {
                continue;
            }

            let mut timestamp = parse_date_time(
                Self::NAME,
                record.get(date_idx).unwrap_or_default(),
                record.get(time_idx).unwrap_or_default(),
                line_index,
            )?;
            if let Some(ms) = ms_idx
                .map(|idx| parse_optional_f64(Self::NAME, record.get(idx), line_index, "ms"))
                .transpose()?
                .flatten()
            {
                timestamp += Duration::milliseconds(ms.round() as i64);
            }

            let value = parse_required_f64(Self::NAME, record.get(level_idx), line_index, "LEVEL")?;
            let temperature = match temp_idx {
                Some(idx) => parse_optional_f64(Self::NAME, record.get(idx), line_index, "TEMPERATURE")?,
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
            header,
            readings,
        })
    }
}
