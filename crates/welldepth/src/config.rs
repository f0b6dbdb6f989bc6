use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use welldepth_core::outputs::OutputFormat;
use welldepth_core::PipelineConfig;
use welldepth_parser::ElevationKeys;

/// The run configuration file: algorithm knobs, where inputs live, where outputs go.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    /// Glob of logger exports. The well id comes from each file name.
    pub loggers: String,
    pub on_site_baro: Option<BaroInput>,
    pub station_baro: Option<BaroInput>,
    pub field_notes: Option<PathBuf>,
    pub manual: Option<PathBuf>,
    pub well_dimensions: Option<PathBuf>,
    pub well_elevations: Option<PathBuf>,
    pub well_id_corrections: Option<PathBuf>,
    pub well_id_list: Option<PathBuf>,
    #[serde(default)]
    pub elevation: ElevationKeysConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaroInput {
    pub files: String,
    pub elevation_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElevationKeysConfig {
    pub well_id: String,
    pub elevation: String,
}

impl Default for ElevationKeysConfig {
    fn default() -> Self {
        let keys = ElevationKeys::default();
        Self {
            well_id: keys.well_id.to_string(),
            elevation: keys.elevation.to_string(),
        }
    }
}

impl ElevationKeysConfig {
    pub fn keys(&self) -> ElevationKeys<'_> {
        ElevationKeys {
            well_id: &self.well_id,
            elevation: &self.elevation,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputsConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
    pub subdaily_stem: String,
    pub daily_stem: String,
    pub anchors_stem: String,
    pub summary_file: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: OutputFormat::Csv,
            subdaily_stem: "subdaily".to_string(),
            daily_stem: "daily".to_string(),
            anchors_stem: "anchors".to_string(),
            summary_file: "run_summary.json".to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content).context("invalid run configuration")?;
        config.pipeline.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }
}

/// Relative paths in the config are relative to the config file's directory.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
