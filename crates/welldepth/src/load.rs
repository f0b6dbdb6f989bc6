//! Input discovery: glob, read, hash, parse, convert.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use welldepth_core::config::PipelineConfig;
use welldepth_core::ingest::{
    barometric_samples, elevation_map, field_windows, manual_measurements, SensorFile,
};
use welldepth_core::report::{InputFileRecord, InputRole, IssueKind, RunIssue, Stage};
use welldepth_core::types::{BaroSource, BarometricSample};
use welldepth_core::validation::WellDepths;
use welldepth_core::wells::WellRegistry;
use welldepth_core::PipelineInputs;
use welldepth_parser::{
    parse_field_notes, parse_logger_bytes, parse_manual_measurements, parse_well_dimensions,
    parse_well_elevations, parse_well_id_corrections, parse_well_id_list, well_id_from_filename,
    ParsedLoggerFile,
};

use crate::config::{resolve, BaroInput, InputsConfig};

/// Parsed inputs plus what was read and what could not be.
pub struct LoadedInputs {
    pub inputs: PipelineInputs,
    pub records: Vec<InputFileRecord>,
    pub issues: Vec<RunIssue>,
}

struct RawFile {
    path: PathBuf,
    bytes: Vec<u8>,
    hash: String,
}

impl RawFile {
    fn read(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let hash = blake3::hash(&bytes).to_hex().to_string();
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            hash,
        })
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn record(&self, role: InputRole, format: Option<&str>, rows: usize) -> InputFileRecord {
        InputFileRecord {
            path: self.path.display().to_string(),
            role,
            blake3: self.hash.clone(),
            format: format.map(str::to_string),
            rows,
        }
    }
}

fn unreadable(path: &Path, reason: impl std::fmt::Display) -> RunIssue {
    warn!(path = %path.display(), %reason, "skipping input file");
    RunIssue::new(
        Stage::Ingest,
        IssueKind::UnreadableInput,
        format!("{}: {reason}", path.display()),
    )
}

fn discover(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = resolve(base, Path::new(pattern));
    let full = full.to_string_lossy();
    let mut paths = Vec::new();
    for entry in glob::glob(&full).with_context(|| format!("invalid glob pattern {full}"))? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "could not read path from glob"),
        }
    }
    paths.sort();
    debug!(pattern = %full, files = paths.len(), "discovered input files");
    Ok(paths)
}

/// Reads every logger-format file matching `pattern`. Unreadable or unparseable files become
/// issues; the rest are returned with their provenance records.
fn read_logger_files(
    base: &Path,
    pattern: &str,
    role: InputRole,
    records: &mut Vec<InputFileRecord>,
    issues: &mut Vec<RunIssue>,
) -> Result<Vec<(PathBuf, ParsedLoggerFile)>> {
    let mut parsed_files = Vec::new();
    for path in discover(base, pattern)? {
        let raw = match RawFile::read(&path) {
            Ok(raw) => raw,
            Err(err) => {
                issues.push(unreadable(&path, format!("{err:#}")));
                continue;
            }
        };
        match parse_logger_bytes(&raw.bytes) {
            Ok(parsed) => {
                records.push(raw.record(role, Some(parsed.format), parsed.readings.len()));
                parsed_files.push((path, parsed));
            }
            Err(err) => {
                records.push(raw.record(role, None, 0));
                issues.push(unreadable(&path, err));
            }
        }
    }
    Ok(parsed_files)
}

fn read_baro(
    base: &Path,
    input: Option<&BaroInput>,
    role: InputRole,
    source: BaroSource,
    records: &mut Vec<InputFileRecord>,
    issues: &mut Vec<RunIssue>,
) -> Result<Vec<BarometricSample>> {
    let Some(input) = input else {
        return Ok(Vec::new());
    };
    let files = read_logger_files(base, &input.files, role, records, issues)?;
    Ok(files
        .iter()
        .flat_map(|(_, parsed)| barometric_samples(parsed, source, input.elevation_m))
        .collect())
}

/// Reads a single named side table. Failures here are fatal: the run would be meaningless
/// without them.
fn read_table<T>(
    base: &Path,
    path: Option<&PathBuf>,
    role: InputRole,
    records: &mut Vec<InputFileRecord>,
    parse: impl FnOnce(&str) -> Result<(T, usize)>,
) -> Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let path = resolve(base, path);
    let raw = RawFile::read(&path)?;
    let (value, rows) =
        parse(&raw.text()).with_context(|| format!("failed to parse {}", path.display()))?;
    records.push(raw.record(role, None, rows));
    Ok(Some(value))
}

pub fn load_inputs(
    base: &Path,
    config: &InputsConfig,
    pipeline: &PipelineConfig,
) -> Result<LoadedInputs> {
    let mut records = Vec::new();
    let mut issues = Vec::new();

    let mut sensor_files = Vec::new();
    for (path, parsed) in
        read_logger_files(base, &config.loggers, InputRole::Logger, &mut records, &mut issues)?
    {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let Some(well_id) = well_id_from_filename(&label) else {
            issues.push(unreadable(&path, "no well id in file name"));
            continue;
        };
        let well_id = well_id.to_string();
        sensor_files.push(SensorFile::from_parsed(label, &well_id, &parsed));
    }

    let on_site_baro = read_baro(
        base,
        config.on_site_baro.as_ref(),
        InputRole::OnSiteBarometer,
        BaroSource::OnSite,
        &mut records,
        &mut issues,
    )?;
    let station_baro = read_baro(
        base,
        config.station_baro.as_ref(),
        InputRole::StationBarometer,
        BaroSource::RemoteStation,
        &mut records,
        &mut issues,
    )?;

    let windows = read_table(
        base,
        config.field_notes.as_ref(),
        InputRole::FieldNotes,
        &mut records,
        |text| {
            let rows = parse_field_notes(text)?;
            let n = rows.len();
            Ok((field_windows(rows), n))
        },
    )?
    .unwrap_or_default();

    let manual = read_table(
        base,
        config.manual.as_ref(),
        InputRole::Manual,
        &mut records,
        |text| {
            let table = parse_manual_measurements(text)?;
            let n = table.rows.len();
            Ok((manual_measurements(table, pipeline.manual_depth_unit), n))
        },
    )?
    .unwrap_or_default();

    let well_depths = read_table(
        base,
        config.well_dimensions.as_ref(),
        InputRole::WellDimensions,
        &mut records,
        |text| {
            let rows = parse_well_dimensions(text)?;
            let n = rows.len();
            Ok((WellDepths::from_rows(rows), n))
        },
    )?
    .unwrap_or_default();

    let keys = config.elevation.keys();
    let elevations = read_table(
        base,
        config.well_elevations.as_ref(),
        InputRole::WellElevations,
        &mut records,
        |text| {
            let wells = parse_well_elevations(text, &keys)?;
            let n = wells.len();
            Ok((elevation_map(wells), n))
        },
    )?
    .unwrap_or_default();

    let corrections = read_table(
        base,
        config.well_id_corrections.as_ref(),
        InputRole::WellIdCorrections,
        &mut records,
        |text| {
            let rows = parse_well_id_corrections(text)?;
            let n = rows.len();
            Ok((rows, n))
        },
    )?
    .unwrap_or_default();

    let valid_ids = read_table(
        base,
        config.well_id_list.as_ref(),
        InputRole::WellIdList,
        &mut records,
        |text| {
            let ids = parse_well_id_list(text);
            let n = ids.len();
            Ok((ids, n))
        },
    )?;

    info!(
        files = records.len(),
        loggers = sensor_files.len(),
        on_site_baro = on_site_baro.len(),
        station_baro = station_baro.len(),
        unreadable = issues.len(),
        "inputs loaded"
    );

    Ok(LoadedInputs {
        inputs: PipelineInputs {
            sensor_files,
            field_windows: windows,
            on_site_baro,
            station_baro,
            manual,
            well_depths,
            elevations,
            wells: WellRegistry::new(valid_ids, corrections),
        },
        records,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGGER: &str = include_str!("../../welldepth-parser/tests/data/EWR-1_2018_0727_0824.csv");
    const BARO: &str = include_str!("../../welldepth-parser/tests/data/baro_2018_0727.csv");
    const FIELD_NOTES: &str = include_str!("../../welldepth-parser/tests/data/field_notes.csv");
    const MANUAL: &str = include_str!("../../welldepth-parser/tests/data/manual.csv");

    fn inputs_config() -> InputsConfig {
        InputsConfig {
            loggers: "loggers/*.csv".to_string(),
            on_site_baro: Some(BaroInput {
                files: "baro/*.csv".to_string(),
                elevation_m: 1935.0,
            }),
            station_baro: None,
            field_notes: Some(PathBuf::from("field_notes.csv")),
            manual: Some(PathBuf::from("manual.csv")),
            well_dimensions: None,
            well_elevations: None,
            well_id_corrections: None,
            well_id_list: None,
            elevation: Default::default(),
        }
    }

    #[test]
    fn loads_and_hashes_inputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("loggers")).unwrap();
        std::fs::create_dir_all(root.join("baro")).unwrap();
        std::fs::write(root.join("loggers/EWR-1_2018_0727_0824.csv"), LOGGER).unwrap();
        std::fs::write(root.join("loggers/notes_only.csv"), "not a logger export\n").unwrap();
        std::fs::write(root.join("baro/baro_2018_0727.csv"), BARO).unwrap();
        std::fs::write(root.join("field_notes.csv"), FIELD_NOTES).unwrap();
        std::fs::write(root.join("manual.csv"), MANUAL).unwrap();

        let loaded =
            load_inputs(root, &inputs_config(), &PipelineConfig::default()).expect("inputs load");

        assert_eq!(loaded.inputs.sensor_files.len(), 1);
        let file = &loaded.inputs.sensor_files[0];
        assert_eq!(file.well_id, "EWR-1");
        assert_eq!(file.samples.len(), 6);
        assert_eq!(loaded.inputs.on_site_baro.len(), 3);
        assert_eq!(loaded.inputs.field_windows.len(), 3);
        assert_eq!(loaded.inputs.manual.len(), 3);
        assert!((loaded.inputs.manual[0].ground_to_water_m.unwrap() - 0.525).abs() < 1e-9);

        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.issues[0].kind, IssueKind::UnreadableInput);

        let logger = loaded
            .records
            .iter()
            .find(|r| r.path.ends_with("EWR-1_2018_0727_0824.csv"))
            .expect("logger record");
        assert_eq!(logger.blake3, blake3::hash(LOGGER.as_bytes()).to_hex().to_string());
        assert_eq!(logger.rows, 6);
        assert!(logger.format.is_some());
    }

    #[test]
    fn missing_side_table_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_inputs(dir.path(), &inputs_config(), &PipelineConfig::default());
        assert!(result.is_err());
    }
}
