//! Documentation coverage aggregation.
//!
//! Two semantics coexist: coverage of docstrings actually present in the
//! source, and coverage that also credits unapplied previews attached to
//! routines. [`CoverageMode`] makes the choice explicit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::DEFAULT_COVERAGE_THRESHOLD;
use crate::core::errors::DocsmithError;
use crate::core::model::{FunctionEntry, ParsingError, UnitMetadata};

/// Which routines count as documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Only docstrings present in the source.
    Documented,
    /// Docstrings present in the source plus attached previews.
    #[default]
    IncludePreviews,
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Documented => "documented",
            Self::IncludePreviews => "include_previews",
        })
    }
}

impl FromStr for CoverageMode {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "documented" => Ok(Self::Documented),
            "include_previews" | "previews" => Ok(Self::IncludePreviews),
            other => Err(DocsmithError::validation_field(
                format!("unknown coverage mode '{other}'"),
                "coverage.mode",
            )),
        }
    }
}

/// Coverage of one source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    /// Path of the unit
    pub file_path: String,
    /// Routines found, degraded entries included
    pub total_functions: usize,
    /// Routines with a docstring in the source
    pub functions_with_docstring: usize,
    /// Routines carrying an attached preview
    pub generated_docstrings: usize,
    /// Coverage, rounded to two decimals
    pub coverage_percent: f64,
    /// Unit-level failures
    pub parsing_errors: Vec<ParsingError>,
}

/// Coverage summed across all units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCoverage {
    /// Units scanned
    pub total_files: usize,
    /// Routines found
    pub total_functions: usize,
    /// Routines with a docstring in the source
    pub functions_with_docstring: usize,
    /// Routines carrying an attached preview
    pub generated_docstrings: usize,
    /// Coverage, rounded to two decimals
    pub coverage_percent: f64,
    /// Unit-level failures across all units
    pub parsing_errors_total: usize,
    /// Threshold the report was computed against
    pub threshold: f64,
    /// `coverage_percent >= threshold`
    pub meets_threshold: bool,
}

/// Persisted coverage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Per-unit coverage in scan order
    pub files: Vec<FileCoverage>,
    /// Totals across units
    pub aggregate: AggregateCoverage,
}

impl CoverageReport {
    /// Units with routines whose coverage is below `threshold`, lowest first.
    pub fn files_below(&self, threshold: f64) -> Vec<&FileCoverage> {
        let mut files: Vec<&FileCoverage> = self
            .files
            .iter()
            .filter(|file| file.total_functions > 0 && file.coverage_percent < threshold)
            .collect();
        files.sort_by(|a, b| {
            a.coverage_percent
                .partial_cmp(&b.coverage_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        files
    }
}

/// Coarse rating of a coverage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageGrade {
    /// Below 70%
    Poor,
    /// 70% up to but excluding 90%
    Average,
    /// 90% and above
    Excellent,
}

impl CoverageGrade {
    /// Grade a percentage.
    pub fn from_percent(percent: f64) -> Self {
        if percent < 70.0 {
            Self::Poor
        } else if percent < 90.0 {
            Self::Average
        } else {
            Self::Excellent
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Average => "Average",
            Self::Excellent => "Excellent",
        }
    }
}

/// Documentation status filter for routine listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Has a docstring in the source
    Documented,
    /// Lacks a docstring in the source
    Undocumented,
}

impl FromStr for DocStatus {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "documented" | "ok" => Ok(Self::Documented),
            "undocumented" | "fix" => Ok(Self::Undocumented),
            other => Err(DocsmithError::validation_field(
                format!("unknown status '{other}'"),
                "status",
            )),
        }
    }
}

/// Compute coverage crediting attached previews.
pub fn compute_coverage(units: &[UnitMetadata], threshold: f64) -> CoverageReport {
    compute_coverage_with_mode(units, threshold, CoverageMode::IncludePreviews)
}

/// Compute coverage with the default threshold.
pub fn compute_default_coverage(units: &[UnitMetadata]) -> CoverageReport {
    compute_coverage(units, DEFAULT_COVERAGE_THRESHOLD)
}

/// Compute coverage under an explicit mode.
pub fn compute_coverage_with_mode(
    units: &[UnitMetadata],
    threshold: f64,
    mode: CoverageMode,
) -> CoverageReport {
    let mut files = Vec::with_capacity(units.len());
    let mut total_functions = 0;
    let mut total_documented = 0;
    let mut total_credited = 0;
    let mut total_generated = 0;
    let mut parsing_errors_total = 0;

    for unit in units {
        let counts = UnitCounts::of(unit, mode);
        total_functions += counts.total;
        total_documented += counts.documented;
        total_credited += counts.credited;
        total_generated += counts.generated;
        parsing_errors_total += unit.parsing_errors.len();

        files.push(FileCoverage {
            file_path: unit.file_path.clone(),
            total_functions: counts.total,
            functions_with_docstring: counts.documented,
            generated_docstrings: counts.generated,
            coverage_percent: percent(counts.credited, counts.total),
            parsing_errors: unit.parsing_errors.clone(),
        });
    }

    let coverage_percent = percent(total_credited, total_functions);
    CoverageReport {
        files,
        aggregate: AggregateCoverage {
            total_files: units.len(),
            total_functions,
            functions_with_docstring: total_documented,
            generated_docstrings: total_generated,
            coverage_percent,
            parsing_errors_total,
            threshold,
            meets_threshold: coverage_percent >= threshold,
        },
    }
}

struct UnitCounts {
    total: usize,
    documented: usize,
    generated: usize,
    credited: usize,
}

impl UnitCounts {
    fn of(unit: &UnitMetadata, mode: CoverageMode) -> Self {
        let functions = &unit.functions;
        let documented = functions.iter().filter(|f| f.has_docstring()).count();
        let generated = functions
            .iter()
            .filter(|f| f.has_generated_docstring())
            .count();
        let credited = match mode {
            CoverageMode::Documented => documented,
            CoverageMode::IncludePreviews => functions
                .iter()
                .filter(|f| f.has_docstring() || f.has_generated_docstring())
                .count(),
        };
        Self {
            total: functions.len(),
            documented,
            generated,
            credited,
        }
    }
}

/// Percentage rounded to two decimals, 0 for an empty denominator.
fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let raw = numerator as f64 / denominator as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// One row of a routine listing.
#[derive(Debug, Clone, Copy)]
pub struct RoutineListing<'a> {
    /// Unit containing the routine
    pub file_path: &'a str,
    /// The routine entry
    pub entry: &'a FunctionEntry,
}

/// List routines whose name contains `search` (case-insensitive) and whose
/// status matches.
pub fn filter_routines<'a>(
    units: &'a [UnitMetadata],
    search: Option<&str>,
    status: Option<DocStatus>,
) -> Vec<RoutineListing<'a>> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    units
        .iter()
        .flat_map(|unit| {
            unit.functions.iter().map(move |entry| RoutineListing {
                file_path: &unit.file_path,
                entry,
            })
        })
        .filter(|listing| {
            needle
                .as_deref()
                .map_or(true, |n| listing.entry.name().to_lowercase().contains(n))
        })
        .filter(|listing| match status {
            Some(DocStatus::Documented) => listing.entry.has_docstring(),
            Some(DocStatus::Undocumented) => !listing.entry.has_docstring(),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{DegradedRoutine, RoutineMetadata};

    fn routine(name: &str, documented: bool) -> FunctionEntry {
        let mut routine = RoutineMetadata::new(name, 1);
        routine.has_docstring = documented;
        routine.docstring = documented.then(|| format!("Docs for {name}."));
        routine.into()
    }

    fn unit(path: &str, functions: Vec<FunctionEntry>) -> UnitMetadata {
        UnitMetadata {
            file_path: path.to_string(),
            functions,
            ..UnitMetadata::default()
        }
    }

    #[test]
    fn per_unit_and_aggregate_percentages() {
        let units = vec![
            unit(
                "a.py",
                vec![routine("a1", true), routine("a2", false), routine("a3", false)],
            ),
            unit("b.py", vec![routine("b1", true)]),
            unit("empty.py", vec![]),
        ];

        let report = compute_coverage(&units, 90.0);
        assert_eq!(report.files[0].coverage_percent, 33.33);
        assert_eq!(report.files[1].coverage_percent, 100.0);
        assert_eq!(report.files[2].coverage_percent, 0.0);
        assert_eq!(report.aggregate.total_files, 3);
        assert_eq!(report.aggregate.total_functions, 4);
        assert_eq!(report.aggregate.functions_with_docstring, 2);
        assert_eq!(report.aggregate.coverage_percent, 50.0);
        assert!(!report.aggregate.meets_threshold);
        assert!(compute_coverage(&units, 50.0).aggregate.meets_threshold);
    }

    #[test]
    fn previews_count_only_in_preview_mode() {
        let mut preview = RoutineMetadata::new("p", 1);
        preview.generated_docstring = Some("\"\"\"\nDo things.\n\"\"\"".into());
        let units = vec![unit("a.py", vec![routine("d", true), preview.into()])];

        let with_previews = compute_coverage(&units, 90.0);
        assert_eq!(with_previews.files[0].generated_docstrings, 1);
        assert_eq!(with_previews.aggregate.coverage_percent, 100.0);
        assert!(with_previews.aggregate.meets_threshold);

        let documented = compute_coverage_with_mode(&units, 90.0, CoverageMode::Documented);
        assert_eq!(documented.aggregate.coverage_percent, 50.0);
        assert_eq!(documented.aggregate.generated_docstrings, 1);
    }

    #[test]
    fn documented_routine_with_preview_is_counted_once() {
        let mut both = RoutineMetadata::new("both", 1);
        both.has_docstring = true;
        both.generated_docstring = Some("\"\"\"\nNew.\n\"\"\"".into());
        let report = compute_coverage(&[unit("a.py", vec![both.into()])], 90.0);
        assert_eq!(report.aggregate.coverage_percent, 100.0);
    }

    #[test]
    fn degraded_routines_count_as_undocumented() {
        let degraded = FunctionEntry::Degraded(DegradedRoutine {
            name: "odd".into(),
            parse_error: "missing body".into(),
        });
        let report = compute_default_coverage(&[unit("a.py", vec![routine("ok", true), degraded])]);
        assert_eq!(report.aggregate.total_functions, 2);
        assert_eq!(report.aggregate.coverage_percent, 50.0);
    }

    #[test]
    fn parsing_errors_are_carried_and_totalled() {
        let mut broken = unit("broken.py", vec![]);
        broken
            .parsing_errors
            .push(ParsingError::new("SyntaxError", "invalid syntax at line 1, column 12"));
        let report = compute_default_coverage(&[broken]);
        assert_eq!(report.files[0].parsing_errors.len(), 1);
        assert_eq!(report.aggregate.parsing_errors_total, 1);
        assert_eq!(report.aggregate.coverage_percent, 0.0);
    }

    #[test]
    fn report_json_uses_contract_keys() {
        let report = compute_default_coverage(&[unit("a.py", vec![routine("f", true)])]);
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "total_files",
            "total_functions",
            "functions_with_docstring",
            "generated_docstrings",
            "coverage_percent",
            "parsing_errors_total",
            "meets_threshold",
        ] {
            assert!(json["aggregate"].get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["files"][0]["file_path"], "a.py");
        assert!(json["files"][0]["parsing_errors"].is_array());
    }

    #[test]
    fn grades() {
        assert_eq!(CoverageGrade::from_percent(69.99), CoverageGrade::Poor);
        assert_eq!(CoverageGrade::from_percent(70.0), CoverageGrade::Average);
        assert_eq!(CoverageGrade::from_percent(90.0), CoverageGrade::Excellent);
    }

    #[test]
    fn filtering_by_name_and_status() {
        let units = vec![
            unit("a.py", vec![routine("load_file", true), routine("save_file", false)]),
            unit("b.py", vec![routine("LOAD_ALL", false)]),
        ];

        let loads = filter_routines(&units, Some("load"), None);
        assert_eq!(loads.len(), 2);

        let to_fix = filter_routines(&units, Some("Load"), Some(DocStatus::Undocumented));
        assert_eq!(to_fix.len(), 1);
        assert_eq!(to_fix[0].file_path, "b.py");

        let ok = filter_routines(&units, None, Some(DocStatus::Documented));
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].entry.name(), "load_file");
    }

    #[test]
    fn modes_parse_from_cli_spellings() {
        assert_eq!("documented".parse::<CoverageMode>().unwrap(), CoverageMode::Documented);
        assert_eq!(
            "include-previews".parse::<CoverageMode>().unwrap(),
            CoverageMode::IncludePreviews
        );
        assert!("everything".parse::<CoverageMode>().is_err());
        assert_eq!("fix".parse::<DocStatus>().unwrap(), DocStatus::Undocumented);
    }

    #[test]
    fn files_below_threshold_are_sorted_ascending() {
        let units = vec![
            unit("a.py", vec![routine("a1", true), routine("a2", false)]),
            unit("b.py", vec![routine("b1", false)]),
            unit("c.py", vec![routine("c1", true)]),
        ];
        let report = compute_default_coverage(&units);
        let below: Vec<&str> = report
            .files_below(90.0)
            .iter()
            .map(|f| f.file_path.as_str())
            .collect();
        assert_eq!(below, vec!["b.py", "a.py"]);
    }
}
