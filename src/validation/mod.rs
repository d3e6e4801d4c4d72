//! Bridges to external Python tooling.
//!
//! Style checking is delegated to `pydocstyle` and maintainability metrics
//! to `radon`. Both run as child processes; a missing executable or an
//! unexpected exit is a [`DocsmithError::ExternalTool`] error. Their
//! numbers are reported as-is and never reconciled with the heuristic
//! complexity computed by the extractor.

pub mod pydocstyle;
pub mod radon;

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::core::errors::{DocsmithError, Result};

pub use pydocstyle::PydocstyleValidator;
pub use radon::RadonMetrics;

/// One style finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code such as `D103`
    pub code: String,
    /// 1-based line, when reported
    pub line: Option<usize>,
    /// Rule description
    pub message: String,
    /// Where the finding applies, e.g. "in public function `add`"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

/// How seriously a caller should treat a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory
    Warning,
    /// Blocking
    Error,
}

impl Violation {
    /// Docstring rules (`D*`) are warnings; anything else is an error.
    pub fn severity(&self) -> Severity {
        if self.code.starts_with('D') {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

/// Checks docstrings in a file against a style checklist.
#[async_trait]
pub trait StyleValidator: Send + Sync {
    /// Report violations for the file at `path`.
    async fn validate(&self, path: &Path) -> Result<Vec<Violation>>;
}

/// Heuristic complexity of one block as reported by an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineComplexity {
    /// Block name
    pub name: String,
    /// Cyclomatic complexity
    pub complexity: u32,
    /// 1-based definition line
    pub line: usize,
}

/// Computes complexity and maintainability for source text.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Per-block cyclomatic complexity.
    async fn complexity(&self, source: &str) -> Result<Vec<RoutineComplexity>>;

    /// Maintainability index, rounded to 2 decimals.
    async fn maintainability(&self, source: &str) -> Result<f64>;
}

/// Run `program` with `args`, failing when it cannot start or exits with a
/// status outside `accepted`.
pub(crate) async fn run_tool(program: &str, args: &[&str], accepted: &[i32]) -> Result<Output> {
    debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program).args(args).output().await.map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "executable not found on PATH".to_string()
        } else {
            e.to_string()
        };
        DocsmithError::external_tool(program, reason)
    })?;

    let code = output.status.code();
    if !code.is_some_and(|code| accepted.contains(&code)) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DocsmithError::external_tool(
            program,
            format!(
                "exited with {}: {}",
                code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            ),
        ));
    }
    Ok(output)
}
