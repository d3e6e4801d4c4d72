//! Output Formatting and Display Functions
//!
//! Tables and colored summaries for each command. Machine-readable formats
//! (JSON, CSV) go to stdout untouched; logs go to stderr.

use console::Term;
use docsmith::detectors::coverage::{CoverageGrade, CoverageReport, RoutineListing};
use docsmith::validation::{RoutineComplexity, Severity, Violation};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;
use tabled::{settings::Style as TableStyle, Table, Tabled};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

/// Start a spinner when stderr is a terminal.
pub fn spinner(message: &str) -> Option<ProgressBar> {
    if !Term::stderr().is_term() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Routines")]
    total: usize,
    #[tabled(rename = "Documented")]
    documented: usize,
    #[tabled(rename = "Previews")]
    previews: usize,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Errors")]
    errors: usize,
}

fn file_rows(report: &CoverageReport) -> Vec<FileRow> {
    report
        .files
        .iter()
        .map(|file| FileRow {
            file: file.file_path.clone(),
            total: file.total_functions,
            documented: file.functions_with_docstring,
            previews: file.generated_docstrings,
            coverage: format!("{:.2}%", file.coverage_percent),
            errors: file.parsing_errors.len(),
        })
        .collect()
}

/// One line per file under the report threshold, lowest coverage first.
pub fn lagging_files(report: &CoverageReport) -> Vec<String> {
    report
        .files_below(report.aggregate.threshold)
        .into_iter()
        .map(|file| {
            format!(
                "{} {:.2}% ({}/{})",
                file.file_path,
                file.coverage_percent,
                file.functions_with_docstring,
                file.total_functions
            )
        })
        .collect()
}

/// Colored grade label.
pub fn grade_label(percent: f64) -> String {
    let grade = CoverageGrade::from_percent(percent);
    match grade {
        CoverageGrade::Excellent => grade.label().bright_green().bold().to_string(),
        CoverageGrade::Average => grade.label().yellow().bold().to_string(),
        CoverageGrade::Poor => grade.label().bright_red().bold().to_string(),
    }
}

/// Display a coverage report with per-file rows and the aggregate.
pub fn display_coverage(report: &CoverageReport) {
    if report.files.is_empty() {
        println!("{}", "No Python files found.".yellow());
        return;
    }

    let mut table = Table::new(file_rows(report));
    table.with(TableStyle::rounded());
    println!("{table}");
    println!();

    let aggregate = &report.aggregate;
    println!(
        "{} {:.2}% ({})",
        "📊 Aggregate coverage:".bold(),
        aggregate.coverage_percent,
        grade_label(aggregate.coverage_percent)
    );
    println!(
        "   {} of {} routines documented across {} files, {} previews",
        aggregate.functions_with_docstring,
        aggregate.total_functions,
        aggregate.total_files,
        aggregate.generated_docstrings
    );
    if aggregate.meets_threshold {
        println!(
            "{} {:.2}%",
            "✅ Meets threshold".bright_green(),
            aggregate.threshold
        );
    } else {
        println!(
            "{} {:.2}%",
            "❌ Below threshold".bright_red(),
            aggregate.threshold
        );
        let lagging = lagging_files(report);
        if !lagging.is_empty() {
            println!();
            println!("{}", "📉 Files below threshold:".bold());
            for line in lagging {
                println!("   {line}");
            }
        }
    }

    let failures: Vec<_> = report
        .files
        .iter()
        .flat_map(|file| {
            file.parsing_errors
                .iter()
                .map(move |error| (file.file_path.as_str(), error))
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("{}", "⚠️  Files that could not be parsed:".yellow().bold());
        for (path, error) in failures {
            println!("   {} {}: {}", path.cyan(), error.error_type, error.message);
        }
    }
}

#[derive(Tabled)]
struct ReviewRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Routine")]
    routine: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Status label for a listed routine.
pub fn listing_status(listing: &RoutineListing<'_>) -> &'static str {
    match listing.entry.as_routine() {
        None => "degraded",
        Some(routine) if routine.has_docstring => "incomplete",
        Some(_) => "missing",
    }
}

/// Display routines that need attention.
pub fn display_review(listings: &[RoutineListing<'_>], style_name: &str) {
    if listings.is_empty() {
        println!(
            "{}",
            format!("🎉 Every routine has a complete {style_name} docstring.").bright_green()
        );
        return;
    }

    let rows: Vec<ReviewRow> = listings
        .iter()
        .map(|listing| ReviewRow {
            file: listing.file_path.to_string(),
            routine: listing.entry.name().to_string(),
            line: listing
                .entry
                .as_routine()
                .map_or_else(|| "-".to_string(), |r| r.start_line.to_string()),
            status: listing_status(listing).to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    println!();
    println!(
        "{} {} routines need a {} docstring",
        "📝".bold(),
        listings.len(),
        style_name
    );
}

/// JSON rows for a routine listing.
pub fn review_json(listings: &[RoutineListing<'_>]) -> serde_json::Value {
    serde_json::Value::Array(
        listings
            .iter()
            .map(|listing| {
                serde_json::json!({
                    "file": listing.file_path,
                    "routine": listing.entry.name(),
                    "line": listing.entry.as_routine().map(|r| r.start_line),
                    "status": listing_status(listing),
                })
            })
            .collect(),
    )
}

/// Print a unified diff with colored lines.
pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Display style violations grouped by file.
pub fn display_violations(results: &[(String, Vec<Violation>)]) {
    let rows: Vec<ViolationRow> = results
        .iter()
        .flat_map(|(file, violations)| {
            violations.iter().map(move |violation| ViolationRow {
                file: file.clone(),
                line: violation
                    .line
                    .map_or_else(|| "-".to_string(), |line| line.to_string()),
                code: violation.code.clone(),
                severity: match violation.severity() {
                    Severity::Warning => "warning".to_string(),
                    Severity::Error => "error".to_string(),
                },
                message: violation.message.clone(),
            })
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "✅ No docstring style violations.".bright_green());
        return;
    }

    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    println!();
    println!("{} {} violations", "⚠️ ".yellow(), count);
}

#[derive(Tabled)]
struct ComplexityRow {
    #[tabled(rename = "Block")]
    name: String,
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Complexity")]
    complexity: u32,
}

/// Display radon metrics for one file.
pub fn display_metrics(path: &Path, blocks: &[RoutineComplexity], maintainability: f64) {
    println!("{} {}", "📈 Metrics for".bold(), path.display().to_string().cyan());
    if blocks.is_empty() {
        println!("   No blocks reported.");
    } else {
        let rows: Vec<ComplexityRow> = blocks
            .iter()
            .map(|block| ComplexityRow {
                name: block.name.clone(),
                line: block.line,
                complexity: block.complexity,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(TableStyle::rounded());
        println!("{table}");
    }
    println!("{} {:.2}", "Maintainability index:".bold(), maintainability);
}
