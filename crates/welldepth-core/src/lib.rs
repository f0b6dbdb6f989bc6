pub mod assembler;
pub mod barometric;
pub mod calibrator;
pub mod compensator;
pub mod config;
pub mod edge_trimmer;
pub mod error;
pub mod ingest;
pub mod outputs;
pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod stats;
pub mod types;
pub mod units;
pub mod validation;
pub mod wells;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{run_pipeline, PipelineInputs, PipelineOutput};
