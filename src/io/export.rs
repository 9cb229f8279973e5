//! Export analyses.
//!
//! - merged timeline as CSV, one column per active forecast method
//! - full analysis (series, forecasts, timeline, growth) as JSON

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::Analysis;
use crate::domain::MergedTimeline;
use crate::error::AppError;

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Write a merged timeline as CSV to any writer. Nulls are empty cells.
pub fn write_timeline_csv_to<W: std::io::Write>(writer: W, timeline: &MergedTimeline) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["period".to_string(), "historical".to_string()];
    header.extend(timeline.methods.iter().map(|m| m.field_name().to_string()));
    out.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write timeline CSV header: {e}")))?;

    for row in &timeline.rows {
        let mut record = vec![row.period.to_string(), fmt_cell(row.historical)];
        record.extend(timeline.methods.iter().map(|&m| fmt_cell(row.forecast(m))));
        out.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write timeline CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush timeline CSV: {e}")))
}

pub fn write_timeline_csv(path: &Path, timeline: &MergedTimeline) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_timeline_csv_to(file, timeline)
}

pub fn write_analysis_json(path: &Path, analysis: &Analysis) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, analysis)
        .map_err(|e| AppError::new(2, format!("Failed to write analysis JSON: {e}")))
}
