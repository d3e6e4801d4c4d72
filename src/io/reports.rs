//! Coverage report persistence and exports.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::errors::{DocsmithError, Result, ResultExt};
use crate::core::model::UnitMetadata;
use crate::detectors::coverage::CoverageReport;

/// Default location of the persisted report.
pub const DEFAULT_REPORT_PATH: &str = "storage/review_logs.json";

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(report: &CoverageReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            DocsmithError::io(
                format!("Failed to create report directory {}", parent.display()),
                e,
            )
        })?;
    }

    let json = serde_json::to_string_pretty(report).context("Failed to serialize coverage report")?;
    fs::write(path, json).map_err(|e| {
        DocsmithError::io(format!("Failed to write report {}", path.display()), e)
    })?;

    info!("Coverage report written to {}", path.display());
    Ok(())
}

/// Load a report previously written by [`write_report`].
pub fn read_report(path: &Path) -> Result<CoverageReport> {
    let content = fs::read_to_string(path).map_err(|e| {
        DocsmithError::io(format!("Failed to read report {}", path.display()), e)
    })?;
    serde_json::from_str(&content).with_context(|| format!("Invalid report {}", path.display()))
}

/// Export one `File,Function,Has Docstring` row per routine.
pub fn render_csv(units: &[UnitMetadata]) -> String {
    let mut out = String::from("File,Function,Has Docstring\n");
    for unit in units {
        for entry in &unit.functions {
            out.push_str(&csv_field(&unit.file_path));
            out.push(',');
            out.push_str(&csv_field(entry.name()));
            out.push(',');
            out.push_str(if entry.has_docstring() { "True" } else { "False" });
            out.push('\n');
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
