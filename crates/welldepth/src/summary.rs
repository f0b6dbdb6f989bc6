use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use welldepth_core::report::{InputFileRecord, RunSummary};
use welldepth_core::PipelineOutput;

#[derive(Default)]
struct WellRow {
    deployments: usize,
    anchored: usize,
    subdaily: usize,
    daily: usize,
}

/// Per-well counts: deployments, anchored deployments, subdaily and daily rows.
pub fn wells_table(output: &PipelineOutput) -> Table {
    let mut rows: BTreeMap<&str, WellRow> = BTreeMap::new();
    for calibration in &output.calibrations {
        let row = rows.entry(calibration.well_id.as_str()).or_default();
        row.deployments += 1;
        if calibration.result.is_ok() {
            row.anchored += 1;
        }
    }
    for sample in &output.subdaily {
        rows.entry(sample.well_id.as_str()).or_default().subdaily += 1;
    }
    for record in &output.daily {
        rows.entry(record.well_id.as_str()).or_default().daily += 1;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["well", "deployments", "anchored", "subdaily rows", "daily rows"]);
    for (well, row) in rows {
        table.add_row(vec![
            well.to_string(),
            row.deployments.to_string(),
            row.anchored.to_string(),
            row.subdaily.to_string(),
            row.daily.to_string(),
        ]);
    }
    table
}

pub fn issues_table(summary: &RunSummary) -> Table {
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for issue in &summary.issues {
        *by_kind.entry(format!("{:?}", issue.kind)).or_default() += 1;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["issue", "count"]);
    for (kind, count) in by_kind {
        table.add_row(vec![kind, count.to_string()]);
    }
    table
}

pub fn inputs_table(records: &[InputFileRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["role", "file", "format", "rows", "blake3"]);
    for record in records {
        table.add_row(vec![
            format!("{:?}", record.role),
            record.path.clone(),
            record.format.clone().unwrap_or_else(|| "-".to_string()),
            record.rows.to_string(),
            record.blake3.chars().take(12).collect(),
        ]);
    }
    table
}
