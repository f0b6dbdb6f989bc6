use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{SolinstExportParser, StationExportParser};
use crate::model::ParsedLoggerFile;

pub trait LoggerParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError>;
}

pub fn parse_logger_file(content: &str) -> Result<ParsedLoggerFile, ParserError> {
    let solinst = SolinstExportParser;
    let station = StationExportParser;
    let parsers: [&dyn LoggerParser; 2] = [&solinst, &station];
    parse_with_parsers(content, &parsers)
}

/// Exports are frequently ISO-8859-1 (degree signs in the unit block); decode lossily.
pub fn parse_logger_bytes(contents: &[u8]) -> Result<ParsedLoggerFile, ParserError> {
    let text = String::from_utf8_lossy(contents);
    parse_logger_file(&text)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn LoggerParser],
) -> Result<ParsedLoggerFile, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
