//! Metadata records produced by a scan.
//!
//! Records are rebuilt from the file contents on every scan and carry no
//! identity between scans. The serialized field names are part of the
//! persisted report contract.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One declared positional parameter of a routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentInfo {
    /// Parameter name
    pub name: String,
    /// Type annotation rendered as source text
    pub annotation: Option<String>,
    /// Default value rendered as source text
    pub default: Option<String>,
}

impl ArgumentInfo {
    /// Create an argument with no annotation and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    /// Set the annotation.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    /// First line
    pub start: usize,
    /// Last line
    pub end: usize,
}

impl LineSpan {
    /// Create a span; `end` is clamped so it never precedes `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Spans always cover at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Structural metadata for one function or method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineMetadata {
    /// Routine name
    pub name: String,
    /// Positional parameters in declaration order
    pub args: Vec<ArgumentInfo>,
    /// Return annotation rendered as source text
    pub returns: Option<String>,
    /// Decorator expressions without the leading `@`
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Whether a non-empty docstring is present
    pub has_docstring: bool,
    /// Cleaned docstring text
    pub docstring: Option<String>,
    /// Line of the `def` keyword
    pub start_line: usize,
    /// Last line of the routine body
    pub end_line: usize,
    /// Heuristic cyclomatic complexity, at least 1
    pub complexity: usize,
    /// Maximum block nesting inside the routine
    pub nesting_depth: usize,
    /// Raised expressions, rendered as source text
    pub raises: BTreeSet<String>,
    /// Whether a `yield` occurs anywhere in the subtree
    pub yields: bool,
    /// Column of the definition keyword
    pub indent: usize,
    /// Declared with `async def`
    #[serde(default)]
    pub is_async: bool,
    /// A `return <expr>` occurs in the routine's own body
    #[serde(default)]
    pub returns_value: bool,
    /// Line of the first body statement
    #[serde(default)]
    pub body_start_line: usize,
    /// The body starts on the same line as the signature's colon
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline_body: bool,
    /// Lines occupied by the existing docstring literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring_span: Option<LineSpan>,
    /// Rendered docstring preview; never written back by a scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_docstring: Option<String>,
}

impl RoutineMetadata {
    /// Minimal record used by tests and synthetic callers.
    pub fn new(name: impl Into<String>, start_line: usize) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            returns: None,
            decorators: Vec::new(),
            has_docstring: false,
            docstring: None,
            start_line,
            end_line: start_line,
            complexity: 1,
            nesting_depth: 0,
            raises: BTreeSet::new(),
            yields: false,
            indent: 0,
            is_async: false,
            returns_value: false,
            body_start_line: start_line + 1,
            inline_body: false,
            docstring_span: None,
            generated_docstring: None,
        }
    }

    /// Whether the Returns block should be rendered for this routine.
    pub fn documents_return(&self) -> bool {
        self.returns.is_some() || self.returns_value
    }

    /// Names of the declared arguments.
    pub fn arg_names(&self) -> Vec<&str> {
        self.args.iter().map(|arg| arg.name.as_str()).collect()
    }
}

/// A routine whose metadata could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedRoutine {
    /// Routine name, or `<unknown>`
    pub name: String,
    /// Why extraction failed
    pub parse_error: String,
}

/// Entry in a unit's function list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionEntry {
    /// Fully extracted routine
    Parsed(Box<RoutineMetadata>),
    /// Extraction failed for this routine only
    Degraded(DegradedRoutine),
}

impl FunctionEntry {
    /// Routine name.
    pub fn name(&self) -> &str {
        match self {
            Self::Parsed(routine) => &routine.name,
            Self::Degraded(degraded) => &degraded.name,
        }
    }

    /// Whether the routine carries a docstring; degraded entries never do.
    pub fn has_docstring(&self) -> bool {
        matches!(self, Self::Parsed(routine) if routine.has_docstring)
    }

    /// Whether a preview has been attached.
    pub fn has_generated_docstring(&self) -> bool {
        matches!(self, Self::Parsed(routine) if routine.generated_docstring.is_some())
    }

    /// Borrow the routine metadata when extraction succeeded.
    pub fn as_routine(&self) -> Option<&RoutineMetadata> {
        match self {
            Self::Parsed(routine) => Some(routine),
            Self::Degraded(_) => None,
        }
    }

    /// Mutably borrow the routine metadata when extraction succeeded.
    pub fn as_routine_mut(&mut self) -> Option<&mut RoutineMetadata> {
        match self {
            Self::Parsed(routine) => Some(routine),
            Self::Degraded(_) => None,
        }
    }
}

impl From<RoutineMetadata> for FunctionEntry {
    fn from(routine: RoutineMetadata) -> Self {
        Self::Parsed(Box::new(routine))
    }
}

/// Structural metadata for one class definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Class name
    pub name: String,
    /// Base class expressions rendered as source text
    pub bases: Vec<String>,
    /// Whether a non-empty docstring is present
    pub has_docstring: bool,
    /// Cleaned docstring text
    pub docstring: Option<String>,
    /// Line of the `class` keyword
    pub start_line: usize,
    /// Last line of the class body
    pub end_line: usize,
    /// Methods defined directly in the class body
    pub methods: Vec<FunctionEntry>,
}

/// A unit-level failure recorded instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingError {
    /// Failure category, e.g. `SyntaxError`
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable detail
    pub message: String,
}

impl ParsingError {
    /// Create a parsing error record.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitMetadata {
    /// Path of the scanned file
    pub file_path: String,
    /// Every routine in the file, at any nesting level
    pub functions: Vec<FunctionEntry>,
    /// Every class in the file, at any nesting level
    pub classes: Vec<ClassMetadata>,
    /// Fully-qualified imported names
    pub imports: Vec<String>,
    /// Unit-level failures
    pub parsing_errors: Vec<ParsingError>,
}

impl UnitMetadata {
    /// Empty record for `file_path`.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// Iterate over successfully extracted routines.
    pub fn routines(&self) -> impl Iterator<Item = &RoutineMetadata> {
        self.functions.iter().filter_map(FunctionEntry::as_routine)
    }

    /// Find the first routine with the given name.
    pub fn find_routine(&self, name: &str) -> Option<&RoutineMetadata> {
        self.routines().find(|routine| routine.name == name)
    }

    /// Whether the unit failed to parse.
    pub fn has_parsing_errors(&self) -> bool {
        !self.parsing_errors.is_empty()
    }
}
