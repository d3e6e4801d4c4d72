//! `pydocstyle` runner.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{run_tool, StyleValidator, Violation};
use crate::core::errors::{DocsmithError, Result};

/// Runs the `pydocstyle` executable.
#[derive(Debug, Clone)]
pub struct PydocstyleValidator {
    program: String,
}

impl Default for PydocstyleValidator {
    fn default() -> Self {
        Self::new("pydocstyle")
    }
}

impl PydocstyleValidator {
    /// Use `program` instead of the executable on `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl StyleValidator for PydocstyleValidator {
    async fn validate(&self, path: &Path) -> Result<Vec<Violation>> {
        let target = path.to_str().ok_or_else(|| {
            DocsmithError::validation(format!("Path is not valid UTF-8: {}", path.display()))
        })?;
        // Exit status 1 means violations were found.
        let output = run_tool(&self.program, &[target], &[0, 1]).await?;
        let violations = parse_report(&String::from_utf8_lossy(&output.stdout));
        debug!("{} violations in {}", violations.len(), path.display());
        Ok(violations)
    }
}

/// Parse the two-line report format:
///
/// ```text
/// pkg/mod.py:3 in public function `add`:
///         D103: Missing docstring in public function
/// ```
pub fn parse_report(report: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut header: Option<(Option<usize>, String)> = None;

    for line in report.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            header = Some(parse_header(line));
            continue;
        }

        let (line_no, context) = header.take().unwrap_or((None, String::new()));
        let body = line.trim();
        let (code, message) = match body.split_once(": ") {
            Some((code, message)) if is_rule_code(code) => (code.to_string(), message.to_string()),
            _ => ("PARSE_ERROR".to_string(), body.to_string()),
        };
        violations.push(Violation {
            code,
            line: line_no,
            message,
            context,
        });
    }
    violations
}

/// `file:LINE context:`. The path may contain spaces and colons, so the
/// location ends at the `:LINE` followed by an `in`/`at` context.
fn parse_header(line: &str) -> (Option<usize>, String) {
    let line = line.trim_end().trim_end_matches(':');
    for (idx, _) in line.match_indices(':') {
        let rest = &line[idx + 1..];
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            continue;
        }
        let line_no = rest[..digits].parse().ok();
        let after = &rest[digits..];
        if after.is_empty() {
            return (line_no, String::new());
        }
        if let Some(context) = after.strip_prefix(' ') {
            if context.starts_with("in ") || context.starts_with("at ") {
                return (line_no, context.trim().to_string());
            }
        }
    }
    (None, String::new())
}

fn is_rule_code(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.as_str().len() >= 3
        && chars.all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_line_entries() {
        let report = "pkg/mod.py:1 at module level:\n        D100: Missing docstring in public module\npkg/mod.py:3 in public function `add`:\n        D103: Missing docstring in public function\n";
        let violations = parse_report(report);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].code, "D100");
        assert_eq!(violations[0].line, Some(1));
        assert_eq!(violations[0].context, "at module level");
        assert_eq!(violations[1].code, "D103");
        assert_eq!(violations[1].line, Some(3));
        assert_eq!(violations[1].message, "Missing docstring in public function");
        assert_eq!(violations[1].context, "in public function `add`");
    }

    #[test]
    fn unrecognised_body_is_a_parse_error_entry() {
        let violations = parse_report("mod.py:7 in public method `run`:\n        something odd happened\n");
        assert_eq!(violations[0].code, "PARSE_ERROR");
        assert_eq!(violations[0].line, Some(7));
        assert_eq!(violations[0].message, "something odd happened");
    }

    #[test]
    fn header_path_may_contain_spaces_and_colons() {
        let violations = parse_report(
            "my dir/m.py:3 in public function `f`:\n        D103: Missing docstring in public function\n",
        );
        assert_eq!(violations[0].line, Some(3));
        assert_eq!(violations[0].context, "in public function `f`");

        assert_eq!(
            parse_header("C:\\work\\my pkg\\m.py:12 at module level:"),
            (Some(12), "at module level".to_string())
        );
        assert_eq!(parse_header("odd header"), (None, String::new()));
    }

    #[test]
    fn empty_report_has_no_violations() {
        assert!(parse_report("").is_empty());
    }
}
