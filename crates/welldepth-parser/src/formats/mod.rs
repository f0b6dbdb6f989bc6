mod common;
mod solinst_export;
mod station_export;

pub use solinst_export::SolinstExportParser;
pub use station_export::StationExportParser;

pub(crate) use common::{
    find_column, is_blank, normalize_column, parse_bool, parse_date_time, parse_optional_f64,
    parse_required_f64, parse_timestamp, read_records,
};
