use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use welldepth_core::config::LogLevel;
use welldepth_core::outputs::{anchors_frame, daily_frame, output_path, subdaily_frame, write_frame};
use welldepth_core::report::RunSummary;
use welldepth_core::run_pipeline;

mod config;
mod load;
mod summary;

use config::{resolve, RunConfig};
use load::load_inputs;

/// Calibrates groundwater logger records to depth below ground.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run configuration (TOML). Falls back to WELLDEPTH_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and write outputs
    Run,
    /// Check the configuration and parse every input without processing
    Validate,
}

fn init_tracing(level: LogLevel, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => std::env::var("WELLDEPTH_CONFIG")
            .map(PathBuf::from)
            .context("--config not given and WELLDEPTH_CONFIG is not set"),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let path = config_path(&cli)?;
    let config = RunConfig::load(&path)?;
    init_tracing(config.pipeline.log_level, cli.json_logs);
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    match cli.command {
        Command::Run => run(&config, base),
        Command::Validate => validate(&config, base),
    }
}

fn validate(config: &RunConfig, base: &Path) -> Result<()> {
    let loaded = load_inputs(base, &config.inputs, &config.pipeline)?;
    println!("{}", summary::inputs_table(&loaded.records));
    if loaded.issues.is_empty() {
        println!("configuration and inputs OK");
    } else {
        for issue in &loaded.issues {
            println!("unreadable: {}", issue.message);
        }
    }
    Ok(())
}

fn run(config: &RunConfig, base: &Path) -> Result<()> {
    let loaded = load_inputs(base, &config.inputs, &config.pipeline)?;
    let output = run_pipeline(loaded.inputs, &config.pipeline).context("pipeline failed")?;

    let outputs = &config.outputs;
    let dir = resolve(base, &outputs.dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let frames = [
        (&outputs.subdaily_stem, subdaily_frame(&output.subdaily)),
        (&outputs.daily_stem, daily_frame(&output.daily)),
        (&outputs.anchors_stem, anchors_frame(&output.calibrations)),
    ];
    for (stem, frame) in frames {
        let mut frame = frame.with_context(|| format!("failed to build {stem} table"))?;
        let target = output_path(&dir, stem, outputs.format);
        write_frame(&mut frame, &target, outputs.format)
            .with_context(|| format!("failed to write {}", target.display()))?;
        info!(path = %target.display(), rows = frame.height(), "wrote output");
    }

    let summary = RunSummary::new(&config.pipeline, loaded.records, &output, loaded.issues);
    let summary_path = dir.join(&outputs.summary_file);
    std::fs::write(&summary_path, summary.to_json_pretty()?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    println!("{}", summary::wells_table(&output));
    if !summary.issues.is_empty() {
        println!("{}", summary::issues_table(&summary));
    }
    println!(
        "run {}: {} subdaily rows, {} daily rows, {} issue(s); summary at {}",
        summary.run_id,
        summary.counts.subdaily_rows,
        summary.counts.daily_rows,
        summary.counts.issues,
        summary_path.display()
    );
    Ok(())
}
