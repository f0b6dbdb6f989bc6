pub mod elevation;
pub mod errors;
pub mod formats;
pub mod model;
mod registry;
pub mod tables;

pub use elevation::{parse_well_elevations, ElevationKeys};
pub use errors::{ParserAttempt, ParserError};
pub use model::{
    well_id_from_filename, FieldNoteRow, LoggerHeader, LoggerReading, ManualRow, MeasurementUnit,
    ParsedLoggerFile, WellDimensionRow, WellElevation, WellIdCorrectionRow,
};
pub use registry::{parse_logger_bytes, parse_logger_file, parse_with_parsers, LoggerParser};
pub use tables::{
    parse_field_notes, parse_manual_measurements, parse_well_dimensions,
    parse_well_id_corrections, parse_well_id_list, ManualTable,
};

#[cfg(test)]
mod tests;
