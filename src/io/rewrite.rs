//! In-place docstring rewriting.
//!
//! A rewrite reads the whole file, splices one docstring block and writes
//! the whole file back. Any failure before the write leaves the file
//! untouched. Concurrent rewrites of the same file are not supported.
//!
//! Two strategies locate the splice point:
//!
//! - [`RewriteStrategy::LineIndex`] trusts the line numbers recorded by the
//!   extractor (`docstring_span` and `body_start_line`).
//! - [`RewriteStrategy::BoundedScan`] scans forward from the line after the
//!   `def` for quote markers, inspecting at most `scan_window` lines. A
//!   docstring longer than the window cannot be replaced; the rewrite is
//!   refused instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tree_sitter::Parser;

use crate::core::config::{RewriteConfig, DEFAULT_SCAN_WINDOW};
use crate::core::errors::{DocsmithError, Result};
use crate::core::model::{LineSpan, RoutineMetadata};
use crate::docstring::formatter::QUOTE;
use crate::lang::python::create_parser;

/// Quote markers recognised by the bounded scan.
const SCAN_MARKERS: [&str; 2] = ["\"\"\"", "'''"];

/// How the existing docstring is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStrategy {
    /// Use the extractor's recorded line numbers.
    #[default]
    LineIndex,
    /// Scan a fixed window of lines for quote markers.
    BoundedScan,
}

/// One splice of a line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdit {
    /// 0-based index of the first affected line
    pub start: usize,
    /// Number of original lines removed
    pub removed: usize,
    /// Replacement lines, without line endings
    pub inserted: Vec<String>,
}

impl SourceEdit {
    /// Original lines covered, 1-based; `None` for a pure insertion.
    pub fn replaced_span(&self) -> Option<LineSpan> {
        (self.removed > 0).then(|| LineSpan::new(self.start + 1, self.start + self.removed))
    }
}

/// Result of a rewrite, applied or previewed.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// Rewritten file
    pub file_path: PathBuf,
    /// Routine whose docstring changed
    pub routine: String,
    /// The splice that was made
    pub edit: SourceEdit,
    /// Unified diff of the splice
    pub diff: String,
    /// Full rewritten source
    pub new_source: String,
    /// Backup written before the change
    pub backup_path: Option<PathBuf>,
    /// Whether the file on disk was changed
    pub written: bool,
}

/// Splices rendered docstrings into source files.
#[derive(Debug, Clone)]
pub struct DocstringRewriter {
    strategy: RewriteStrategy,
    scan_window: usize,
    backup: bool,
}

impl Default for DocstringRewriter {
    fn default() -> Self {
        Self::new(RewriteStrategy::default())
    }
}

impl DocstringRewriter {
    /// Create a rewriter with the default window and no backups.
    pub fn new(strategy: RewriteStrategy) -> Self {
        Self {
            strategy,
            scan_window: DEFAULT_SCAN_WINDOW,
            backup: false,
        }
    }

    /// Create a rewriter from configuration.
    pub fn from_config(config: &RewriteConfig) -> Self {
        Self {
            strategy: config.strategy,
            scan_window: config.scan_window.max(1),
            backup: config.backup,
        }
    }

    /// Set the bounded scan window.
    pub fn with_scan_window(mut self, lines: usize) -> Self {
        self.scan_window = lines.max(1);
        self
    }

    /// Keep a `.bak` copy of each rewritten file.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Active strategy.
    pub fn strategy(&self) -> RewriteStrategy {
        self.strategy
    }

    /// Compute the rewrite without touching the file.
    pub fn preview(
        &self,
        path: &Path,
        routine: &RoutineMetadata,
        docstring: &str,
    ) -> Result<RewriteOutcome> {
        let source = read_source(path)?;
        self.outcome(path, &source, routine, docstring)
    }

    /// Rewrite the routine's docstring in place.
    pub fn apply(
        &self,
        path: &Path,
        routine: &RoutineMetadata,
        docstring: &str,
    ) -> Result<RewriteOutcome> {
        let source = read_source(path)?;
        let mut outcome = self.outcome(path, &source, routine, docstring)?;

        if self.backup {
            let backup_path = backup_path_for(path);
            fs::copy(path, &backup_path).map_err(|e| {
                DocsmithError::io(
                    format!("Failed to create backup {}", backup_path.display()),
                    e,
                )
            })?;
            outcome.backup_path = Some(backup_path);
        }

        fs::write(path, &outcome.new_source).map_err(|e| {
            DocsmithError::io(format!("Failed to write {}", path.display()), e)
        })?;
        outcome.written = true;

        info!(
            "Rewrote docstring of '{}' in {} at line {}",
            routine.name,
            path.display(),
            outcome.edit.start + 1
        );
        Ok(outcome)
    }

    fn outcome(
        &self,
        path: &Path,
        source: &str,
        routine: &RoutineMetadata,
        docstring: &str,
    ) -> Result<RewriteOutcome> {
        let file_label = path.display().to_string();
        let edit = self
            .plan(source, routine, docstring)
            .map_err(|message| {
                warn!(
                    "Skipping rewrite of '{}' in {}: {}",
                    routine.name, file_label, message
                );
                DocsmithError::rewrite(&file_label, &routine.name, message)
            })?;

        let new_source = splice(source, &edit);
        let mut parser = create_parser()?;
        if !still_parses(&mut parser, source, &new_source)? {
            return Err(DocsmithError::rewrite(
                &file_label,
                &routine.name,
                "the rewritten source no longer parses",
            ));
        }

        let diff = unified_diff(&file_label, source, &edit);
        debug!("Planned rewrite for '{}':\n{}", routine.name, diff);

        Ok(RewriteOutcome {
            file_path: path.to_path_buf(),
            routine: routine.name.clone(),
            edit,
            diff,
            new_source,
            backup_path: None,
            written: false,
        })
    }

    /// Work out which lines to replace. Errors are diagnostics; nothing is
    /// ever guessed.
    pub fn plan(
        &self,
        source: &str,
        routine: &RoutineMetadata,
        docstring: &str,
    ) -> std::result::Result<SourceEdit, String> {
        if routine.inline_body {
            return Err(format!(
                "the body of '{}' shares its line with the definition",
                routine.name
            ));
        }

        let lines: Vec<&str> = source.lines().collect();
        if routine.start_line == 0 || routine.start_line > lines.len() {
            return Err(format!(
                "definition line {} is outside the file ({} lines); rescan first",
                routine.start_line,
                lines.len()
            ));
        }

        match self.strategy {
            RewriteStrategy::LineIndex => plan_line_index(&lines, routine, docstring),
            RewriteStrategy::BoundedScan => {
                plan_bounded_scan(&lines, routine, docstring, self.scan_window)
            }
        }
    }
}

fn plan_line_index(
    lines: &[&str],
    routine: &RoutineMetadata,
    docstring: &str,
) -> std::result::Result<SourceEdit, String> {
    let indent = body_indent(lines, routine);
    let inserted = docstring_block(docstring, &indent);

    if let Some(span) = routine.docstring_span {
        let opening_line = span
            .start
            .checked_sub(1)
            .and_then(|idx| lines.get(idx))
            .filter(|_| span.end <= lines.len());
        if !opening_line.is_some_and(|line| line.contains(['"', '\''])) {
            return Err(format!(
                "no docstring found at line {}; the file changed since it was scanned",
                span.start
            ));
        }
        if !holds_only_literal(lines[span.start - 1], lines[span.end.max(span.start) - 1]) {
            return Err(shared_line_message(span.start));
        }
        return Ok(SourceEdit {
            start: span.start - 1,
            removed: span.len(),
            inserted,
        });
    }

    let body_start = routine.body_start_line;
    if body_start <= routine.start_line || body_start > lines.len() {
        return Err(format!(
            "body start line {body_start} is not inside the file; rescan first"
        ));
    }
    Ok(SourceEdit {
        start: body_start - 1,
        removed: 0,
        inserted,
    })
}

fn plan_bounded_scan(
    lines: &[&str],
    routine: &RoutineMetadata,
    docstring: &str,
    window: usize,
) -> std::result::Result<SourceEdit, String> {
    let indent = " ".repeat(routine.indent + 4);
    let inserted = docstring_block(docstring, &indent);
    let first = routine.start_line;

    if !routine.has_docstring && routine.docstring_span.is_none() {
        return Ok(SourceEdit {
            start: first,
            removed: 0,
            inserted,
        });
    }

    let last = (first + window).min(lines.len());
    let mut opening: Option<(usize, &str)> = None;
    for (idx, line) in lines.iter().enumerate().take(last).skip(first) {
        match opening {
            None => {
                let Some(marker) = first_marker(line) else {
                    continue;
                };
                if line.matches(marker).count() >= 2 {
                    if !holds_only_literal(line, line) {
                        return Err(shared_line_message(idx + 1));
                    }
                    return Ok(SourceEdit {
                        start: idx,
                        removed: 1,
                        inserted,
                    });
                }
                opening = Some((idx, marker));
            }
            Some((start, marker)) => {
                if line.contains(marker) {
                    if !holds_only_literal(lines[start], line) {
                        return Err(shared_line_message(start + 1));
                    }
                    return Ok(SourceEdit {
                        start,
                        removed: idx - start + 1,
                        inserted,
                    });
                }
            }
        }
    }

    Err(match opening {
        None => format!("no opening quotes within {window} lines of the definition"),
        Some((start, _)) => format!(
            "closing quotes for the docstring opened at line {} not found within {window} lines",
            start + 1
        ),
    })
}

/// Whether the first line starts with the literal and the last line ends
/// with it, so replacing whole lines removes nothing but the docstring.
fn holds_only_literal(first: &str, last: &str) -> bool {
    let opening = first
        .trim_start()
        .trim_start_matches(['r', 'R', 'u', 'U']);
    let closing = last.trim_end();
    opening.starts_with(['"', '\'']) && closing.ends_with(['"', '\''])
}

fn shared_line_message(line: usize) -> String {
    format!("the docstring at line {line} shares a line with other code")
}

/// Earliest quote marker on the line.
fn first_marker(line: &str) -> Option<&'static str> {
    SCAN_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker).map(|pos| (pos, *marker)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, marker)| marker)
}

/// Indentation for the docstring block: the body's own indentation when it
/// is deeper than the definition, otherwise four columns past it.
fn body_indent(lines: &[&str], routine: &RoutineMetadata) -> String {
    let fallback = " ".repeat(routine.indent + 4);
    let Some(line) = routine
        .body_start_line
        .checked_sub(1)
        .and_then(|idx| lines.get(idx))
    else {
        return fallback;
    };

    let leading: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
    if leading.len() > routine.indent && !line.trim().is_empty() {
        leading
    } else {
        fallback
    }
}

/// Quote and indent a rendered docstring, one line per element.
pub fn docstring_block(docstring: &str, indent: &str) -> Vec<String> {
    let mut text = docstring.trim();
    if text.len() >= 2 * QUOTE.len() && text.starts_with(QUOTE) && text.ends_with(QUOTE) {
        text = text[QUOTE.len()..text.len() - QUOTE.len()].trim();
    }

    let mut block = Vec::new();
    block.push(format!("{indent}{QUOTE}"));
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            block.push(String::new());
        } else {
            block.push(format!("{indent}{line}"));
        }
    }
    block.push(format!("{indent}{QUOTE}"));
    block
}

/// Apply `edit`, keeping the file's line ending style.
pub fn splice(source: &str, edit: &SourceEdit) -> String {
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let original: Vec<&str> = source.split_inclusive('\n').collect();

    let mut out = String::with_capacity(source.len() + edit.inserted.len() * 40);
    for line in original.iter().take(edit.start) {
        out.push_str(line);
    }
    for line in &edit.inserted {
        out.push_str(line);
        out.push_str(newline);
    }
    for line in original.iter().skip(edit.start + edit.removed) {
        out.push_str(line);
    }
    out
}

/// Render the splice as a single-hunk unified diff.
pub fn unified_diff(file_label: &str, source: &str, edit: &SourceEdit) -> String {
    let removed: Vec<&str> = source
        .lines()
        .skip(edit.start)
        .take(edit.removed)
        .collect();
    let old_start = if edit.removed == 0 { edit.start } else { edit.start + 1 };
    let new_start = if edit.inserted.is_empty() { edit.start } else { edit.start + 1 };

    let mut diff = format!(
        "--- a/{file_label}\n+++ b/{file_label}\n@@ -{old_start},{} +{new_start},{} @@\n",
        edit.removed,
        edit.inserted.len()
    );
    for line in removed {
        diff.push('-');
        diff.push_str(line);
        diff.push('\n');
    }
    for line in &edit.inserted {
        diff.push('+');
        diff.push_str(line);
        diff.push('\n');
    }
    diff
}

/// False when a parseable file would become unparseable. A parser that
/// yields no tree at all is an internal failure, not a verdict.
fn still_parses(parser: &mut Parser, before: &str, after: &str) -> Result<bool> {
    let mut has_error = |text: &str| {
        parser
            .parse(text, None)
            .map(|tree| tree.root_node().has_error())
            .ok_or_else(|| {
                DocsmithError::internal("tree-sitter returned no syntax tree")
                    .with_context("re-parsing the rewritten source")
            })
    };
    Ok(has_error(before)? || !has_error(after)?)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| DocsmithError::io(format!("Failed to read {}", path.display()), e))
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::python::PythonExtractor;
    use tempfile::tempdir;

    const NEW_DOC: &str = "\"\"\"\nAdd two integers.\n\nArgs:\n    a (int): First value.\n\"\"\"";

    fn routine_in(source: &str, name: &str) -> RoutineMetadata {
        let unit = PythonExtractor::new().unwrap().extract_source(source, "t.py");
        unit.find_routine(name).unwrap().clone()
    }

    #[test]
    fn inserts_before_first_body_statement() {
        let source = "def add(a,\n        b):\n    return a + b\n";
        let routine = routine_in(source, "add");
        let edit = DocstringRewriter::default().plan(source, &routine, NEW_DOC).unwrap();
        assert_eq!(edit.start, 2);
        assert_eq!(edit.removed, 0);
        assert_eq!(
            splice(source, &edit),
            "def add(a,\n        b):\n    \"\"\"\n    Add two integers.\n\n    Args:\n        a (int): First value.\n    \"\"\"\n    return a + b\n"
        );
    }

    #[test]
    fn replaces_recorded_docstring_span() {
        let source = "class C:\n    def add(self, a):\n        '''Old\n        text.'''\n        return a\n";
        let routine = routine_in(source, "add");
        let edit = DocstringRewriter::default().plan(source, &routine, NEW_DOC).unwrap();
        assert_eq!(edit.replaced_span(), Some(LineSpan::new(3, 4)));

        let rewritten = splice(source, &edit);
        assert!(rewritten.starts_with("class C:\n    def add(self, a):\n        \"\"\"\n        Add two integers.\n"));
        assert!(rewritten.ends_with("        \"\"\"\n        return a\n"));
        assert!(!rewritten.contains("Old"));
    }

    #[test]
    fn inline_bodies_are_refused() {
        let source = "def one(): return 1\n";
        let routine = routine_in(source, "one");
        let err = DocstringRewriter::default().plan(source, &routine, NEW_DOC).unwrap_err();
        assert!(err.contains("shares its line"));
    }

    #[test]
    fn bounded_scan_replaces_single_line_docstring() {
        let source = "def f(a):\n    \"\"\"Old.\"\"\"\n    return a\n";
        let routine = routine_in(source, "f");
        let edit = DocstringRewriter::new(RewriteStrategy::BoundedScan)
            .plan(source, &routine, NEW_DOC)
            .unwrap();
        assert_eq!(edit.start, 1);
        assert_eq!(edit.removed, 1);
    }

    #[test]
    fn bounded_scan_refuses_unterminated_window() {
        let mut source = String::from("def f(a):\n    \"\"\"Start of a long docstring\n");
        for i in 0..60 {
            source.push_str(&format!("    line {i}\n"));
        }
        source.push_str("    \"\"\"\n    return a\n");

        let routine = routine_in(&source, "f");
        let rewriter = DocstringRewriter::new(RewriteStrategy::BoundedScan);
        let err = rewriter.plan(&source, &routine, NEW_DOC).unwrap_err();
        assert!(err.contains("closing quotes"));

        let edit = rewriter
            .with_scan_window(80)
            .plan(&source, &routine, NEW_DOC)
            .unwrap();
        assert_eq!(edit.removed, 62);
    }

    #[test]
    fn docstring_sharing_a_line_is_refused() {
        let source = "def f(a):\n    \"\"\"Old.\"\"\"; a = a + 1\n    return a\n";
        let routine = routine_in(source, "f");
        for strategy in [RewriteStrategy::LineIndex, RewriteStrategy::BoundedScan] {
            let err = DocstringRewriter::new(strategy)
                .plan(source, &routine, NEW_DOC)
                .unwrap_err();
            assert!(err.contains("shares a line with other code"), "{strategy:?}: {err}");
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        fs::write(&path, source).unwrap();
        let err = DocstringRewriter::default()
            .apply(&path, &routine, NEW_DOC)
            .unwrap_err();
        assert!(matches!(err, DocsmithError::Rewrite { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn multi_line_docstring_followed_by_code_is_refused() {
        let source = "def f(a):\n    \"\"\"Old\n    text.\"\"\"; a += 1\n    return a\n";
        let routine = routine_in(source, "f");
        let err = DocstringRewriter::default()
            .plan(source, &routine, NEW_DOC)
            .unwrap_err();
        assert!(err.contains("line 2"));
    }

    #[test]
    fn bounded_scan_inserts_after_definition_line() {
        let source = "def f(a):\n    return a\n";
        let routine = routine_in(source, "f");
        let edit = DocstringRewriter::new(RewriteStrategy::BoundedScan)
            .plan(source, &routine, NEW_DOC)
            .unwrap();
        assert_eq!(edit.start, 1);
        assert_eq!(edit.removed, 0);
    }

    #[test]
    fn diff_covers_exactly_the_splice() {
        let source = "def f(a):\n    \"\"\"Old.\"\"\"\n    return a\n";
        let routine = routine_in(source, "f");
        let edit = DocstringRewriter::default().plan(source, &routine, "\"\"\"\nNew text here.\n\"\"\"").unwrap();
        let diff = unified_diff("t.py", source, &edit);
        assert_eq!(
            diff,
            "--- a/t.py\n+++ b/t.py\n@@ -2,1 +2,3 @@\n-    \"\"\"Old.\"\"\"\n+    \"\"\"\n+    New text here.\n+    \"\"\"\n"
        );
    }

    #[test]
    fn apply_writes_file_and_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        let source = "def f(a):\n    return a\n";
        fs::write(&path, source).unwrap();

        let routine = routine_in(source, "f");
        let outcome = DocstringRewriter::default()
            .with_backup(true)
            .apply(&path, &routine, NEW_DOC)
            .unwrap();

        assert!(outcome.written);
        let backup = outcome.backup_path.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), source);

        let rescanned = PythonExtractor::new().unwrap().extract_file(&path);
        let f = rescanned.find_routine("f").unwrap();
        assert!(f.has_docstring);
        assert!(f.docstring.as_deref().unwrap().starts_with("Add two integers."));
    }

    #[test]
    fn failed_plan_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        let source = "def f(a): return a\n";
        fs::write(&path, source).unwrap();

        let routine = routine_in(source, "f");
        let err = DocstringRewriter::default()
            .apply(&path, &routine, NEW_DOC)
            .unwrap_err();
        assert!(matches!(err, DocsmithError::Rewrite { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn reparse_guard_compares_before_and_after() {
        let mut parser = create_parser().unwrap();
        assert!(still_parses(&mut parser, "x = 1\n", "x = 2\n").unwrap());
        assert!(!still_parses(&mut parser, "x = 1\n", "x = (\n").unwrap());
        assert!(still_parses(&mut parser, "x = (\n", "x = ((\n").unwrap());
    }

    #[test]
    fn parser_without_grammar_is_an_internal_error() {
        let err = still_parses(&mut Parser::new(), "x = 1\n", "x = 2\n").unwrap_err();
        match err {
            DocsmithError::Internal { message, context } => {
                assert!(message.contains("no syntax tree"));
                assert_eq!(context.as_deref(), Some("re-parsing the rewritten source"));
            }
            other => panic!("expected internal error, got {other:?}"),
        }
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let source = "def f(a):\r\n    return a\r\n";
        let routine = routine_in(source, "f");
        let edit = DocstringRewriter::default().plan(source, &routine, "\"\"\"\nDo it.\n\"\"\"").unwrap();
        assert_eq!(
            splice(source, &edit),
            "def f(a):\r\n    \"\"\"\r\n    Do it.\r\n    \"\"\"\r\n    return a\r\n"
        );
    }

    #[test]
    fn block_strips_outer_quotes_and_blank_line_indent() {
        let block = docstring_block("\"\"\"\nSummary.\n\nMore.\n\"\"\"", "    ");
        assert_eq!(block, vec!["    \"\"\"", "    Summary.", "", "    More.", "    \"\"\""]);
    }
}
