//! Export the run summary and decoded parameters as JSON.
//!
//! The JSON export is the machine-readable companion of the text report,
//! meant for downstream scripts that would otherwise scrape stdout.

use std::fs::File;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::domain::RunConfig;
use crate::error::AppError;
use crate::fit::FitDiagnostics;
use crate::report::ParameterReport;

#[derive(Serialize)]
struct ReportFile<'a> {
    tool: &'static str,
    date: chrono::NaiveDate,
    algorithm: &'a str,
    diagnostics: &'a FitDiagnostics,
    parameters: &'a ParameterReport,
}

/// Write the report JSON file.
pub fn write_report_json(
    path: &Path,
    config: &RunConfig,
    diagnostics: &FitDiagnostics,
    parameters: &ParameterReport,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("failed to create", path, e))?;

    let report = ReportFile {
        tool: "ffit",
        date: Local::now().date_naive(),
        algorithm: config.algorithm.display_name(),
        diagnostics,
        parameters,
    };

    serde_json::to_writer_pretty(file, &report)
        .map_err(|e| AppError::io("failed to write", path, std::io::Error::other(e)))?;
    Ok(())
}
