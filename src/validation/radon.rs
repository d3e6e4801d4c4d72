//! `radon` runner.

use std::io::Write;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{run_tool, MetricsProvider, RoutineComplexity};
use crate::core::errors::{DocsmithError, DocsmithResultExt, Result};

const TOOL: &str = "radon";

/// Runs `radon cc` and `radon mi` on a temporary copy of the source.
#[derive(Debug, Clone)]
pub struct RadonMetrics {
    program: String,
}

impl Default for RadonMetrics {
    fn default() -> Self {
        Self::new(TOOL)
    }
}

impl RadonMetrics {
    /// Use `program` instead of the executable on `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run_json(&self, subcommand: &str, source: &str) -> Result<Value> {
        let file = source_file(source)?;
        let target = file.path().to_string_lossy().into_owned();
        let output = run_tool(&self.program, &[subcommand, "-j", &target], &[0]).await?;

        let json: Value = serde_json::from_slice(&output.stdout)
            .map_json_err(&format!("radon {subcommand} output"))?;
        // The report is keyed by file path; there is exactly one file.
        let entry = json
            .as_object()
            .and_then(|files| files.values().next().cloned())
            .ok_or_else(|| DocsmithError::external_tool(TOOL, "empty report"))?;
        if let Some(error) = entry.get("error").and_then(Value::as_str) {
            return Err(DocsmithError::external_tool(TOOL, error));
        }
        Ok(entry)
    }
}

#[async_trait]
impl MetricsProvider for RadonMetrics {
    async fn complexity(&self, source: &str) -> Result<Vec<RoutineComplexity>> {
        let entry = self.run_json("cc", source).await?;
        parse_blocks(&entry)
    }

    async fn maintainability(&self, source: &str) -> Result<f64> {
        let entry = self.run_json("mi", source).await?;
        let mi = entry
            .get("mi")
            .and_then(Value::as_f64)
            .ok_or_else(|| DocsmithError::external_tool(TOOL, "report has no 'mi' value"))?;
        Ok((mi * 100.0).round() / 100.0)
    }
}

fn source_file(source: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("docsmith-")
        .suffix(".py")
        .tempfile()
        .map_err(|e| DocsmithError::io("Failed to create temporary source file", e))?;
    file.write_all(source.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| DocsmithError::io("Failed to write temporary source file", e))?;
    Ok(file)
}

/// Flatten the `cc` block list.
fn parse_blocks(entry: &Value) -> Result<Vec<RoutineComplexity>> {
    let blocks = entry
        .as_array()
        .ok_or_else(|| DocsmithError::external_tool(TOOL, "unexpected cc report shape"))?;

    Ok(blocks
        .iter()
        .filter_map(|block| {
            Some(RoutineComplexity {
                name: block.get("name")?.as_str()?.to_string(),
                complexity: u32::try_from(block.get("complexity")?.as_u64()?).ok()?,
                line: usize::try_from(block.get("lineno")?.as_u64()?).ok()?,
            })
        })
        .collect())
}
