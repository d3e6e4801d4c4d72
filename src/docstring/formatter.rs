//! Deterministic docstring rendering.
//!
//! Rendering is a pure function of the routine metadata, the semantic
//! content and the layout: identical inputs always produce byte-identical
//! text. The output carries its own `"""` markers on separate lines.

use super::content::{default_summary, SemanticContent};
use super::{DocstringStyle, PLACEHOLDER_DESCRIPTION, PLACEHOLDER_TYPE};
use crate::core::errors::Result;
use crate::core::model::RoutineMetadata;

/// Docstring quote marker.
pub const QUOTE: &str = "\"\"\"";

/// Render `routine` in the layout named by `style`.
///
/// Unknown layout names are rejected rather than mapped to a default.
pub fn render(routine: &RoutineMetadata, style: &str, content: &SemanticContent) -> Result<String> {
    let style: DocstringStyle = style.parse()?;
    Ok(DocstringFormatter::new(style).render(routine, content))
}

/// Renders docstrings in one layout.
#[derive(Debug, Clone, Copy)]
pub struct DocstringFormatter {
    style: DocstringStyle,
}

impl DocstringFormatter {
    /// Create a formatter for `style`.
    pub fn new(style: DocstringStyle) -> Self {
        Self { style }
    }

    /// Target layout.
    pub fn style(&self) -> DocstringStyle {
        self.style
    }

    /// Render the quoted docstring.
    pub fn render(&self, routine: &RoutineMetadata, content: &SemanticContent) -> String {
        let view = ContentView::new(routine, content);
        let mut lines = match self.style {
            DocstringStyle::Google => google_lines(&view),
            DocstringStyle::Numpy => numpy_lines(&view),
            DocstringStyle::Rest => rest_lines(&view),
        };

        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        format!("{QUOTE}\n{}\n{QUOTE}", lines.join("\n"))
    }
}

/// Metadata and content merged, with placeholders for anything missing.
struct ContentView<'a> {
    routine: &'a RoutineMetadata,
    content: &'a SemanticContent,
}

impl<'a> ContentView<'a> {
    fn new(routine: &'a RoutineMetadata, content: &'a SemanticContent) -> Self {
        Self { routine, content }
    }

    fn summary(&self) -> String {
        let summary = self.content.summary.trim();
        if summary.is_empty() {
            default_summary(&self.routine.name)
        } else {
            summary.to_string()
        }
    }

    /// `(name, type, description)` per declared argument.
    fn args(&self) -> Vec<(&'a str, &'a str, &'a str)> {
        self.routine
            .args
            .iter()
            .map(|arg| {
                let ty = arg.annotation.as_deref().unwrap_or(PLACEHOLDER_TYPE);
                let description = non_empty(self.content.args.get(&arg.name).map(String::as_str));
                (arg.name.as_str(), ty, description)
            })
            .collect()
    }

    fn return_type(&self) -> &'a str {
        self.routine.returns.as_deref().unwrap_or(PLACEHOLDER_TYPE)
    }

    fn return_description(&self) -> &'a str {
        non_empty(Some(self.content.returns.as_str()))
    }

    fn has_return_block(&self) -> bool {
        self.routine.documents_return()
    }

    fn is_generator(&self) -> bool {
        self.routine.yields
    }

    /// Content exceptions in content order, then extracted ones not covered.
    fn raises(&self) -> Vec<(String, &'a str)> {
        let mut entries: Vec<(String, &'a str)> = self
            .content
            .raises
            .iter()
            .map(|(name, description)| (name.clone(), non_empty(Some(description.as_str()))))
            .collect();

        for raised in &self.routine.raises {
            let name = exception_name(raised);
            if name.is_empty() || entries.iter().any(|(known, _)| known == name) {
                continue;
            }
            entries.push((name.to_string(), PLACEHOLDER_DESCRIPTION));
        }
        entries
    }
}

fn non_empty(description: Option<&str>) -> &str {
    match description.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => PLACEHOLDER_DESCRIPTION,
    }
}

/// Exception name of a raised expression: its text up to the first `(`.
fn exception_name(raised: &str) -> &str {
    raised.split('(').next().unwrap_or(raised).trim()
}

fn underlined(lines: &mut Vec<String>, header: &str) {
    lines.push(header.to_string());
    lines.push("-".repeat(header.len()));
}

fn google_lines(view: &ContentView) -> Vec<String> {
    let mut lines = vec![view.summary(), String::new()];

    let args = view.args();
    if !args.is_empty() {
        lines.push("Args:".to_string());
        for (name, ty, description) in args {
            lines.push(format!("    {name} ({ty}): {description}"));
        }
        lines.push(String::new());
    }

    if view.is_generator() {
        lines.push("Yields:".to_string());
        lines.push(format!(
            "    {}: {}",
            view.return_type(),
            view.return_description()
        ));
        lines.push(String::new());
    } else if view.has_return_block() {
        lines.push("Returns:".to_string());
        lines.push(format!(
            "    {}: {}",
            view.return_type(),
            view.return_description()
        ));
        lines.push(String::new());
    }

    let raises = view.raises();
    if !raises.is_empty() {
        lines.push("Raises:".to_string());
        for (name, description) in raises {
            lines.push(format!("    {name}: {description}"));
        }
    }

    lines
}

fn numpy_lines(view: &ContentView) -> Vec<String> {
    let mut lines = vec![view.summary(), String::new()];

    underlined(&mut lines, "Parameters");
    for (name, ty, description) in view.args() {
        lines.push(format!("{name} : {ty}"));
        lines.push(format!("    {description}"));
    }

    let return_header = if view.is_generator() {
        Some("Yields")
    } else if view.has_return_block() {
        Some("Returns")
    } else {
        None
    };
    if let Some(header) = return_header {
        lines.push(String::new());
        underlined(&mut lines, header);
        lines.push(view.return_type().to_string());
        lines.push(format!("    {}", view.return_description()));
    }

    let raises = view.raises();
    if !raises.is_empty() {
        lines.push(String::new());
        underlined(&mut lines, "Raises");
        for (name, description) in raises {
            lines.push(name);
            lines.push(format!("    {description}"));
        }
    }

    lines
}

fn rest_lines(view: &ContentView) -> Vec<String> {
    let mut lines = vec![view.summary(), String::new()];

    for (name, ty, description) in view.args() {
        lines.push(format!(":param {name}: {description}"));
        lines.push(format!(":type {name}: {ty}"));
    }

    if view.has_return_block() || view.is_generator() {
        lines.push(format!(":return: {}", view.return_description()));
        lines.push(format!(":rtype: {}", view.return_type()));
    }

    for (name, description) in view.raises() {
        lines.push(format!(":raises {name}: {description}"));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::DocsmithError;
    use crate::core::model::ArgumentInfo;
    use crate::docstring::detect_style;

    fn add_routine() -> RoutineMetadata {
        let mut routine = RoutineMetadata::new("add", 1);
        routine.args = vec![
            ArgumentInfo::new("a").with_annotation("int"),
            ArgumentInfo::new("b").with_annotation("int"),
        ];
        routine.returns = Some("int".to_string());
        routine.returns_value = true;
        routine
    }

    fn add_content() -> SemanticContent {
        SemanticContent::with_summary("Add two integers.")
            .arg("a", "First value.")
            .arg("b", "Second value.")
            .returns("Sum.")
    }

    #[test]
    fn google_layout_for_two_argument_routine() {
        let text = render(&add_routine(), "google", &add_content()).unwrap();
        assert_eq!(
            text,
            "\"\"\"\nAdd two integers.\n\nArgs:\n    a (int): First value.\n    b (int): Second value.\n\nReturns:\n    int: Sum.\n\"\"\""
        );
        assert!(!text.contains("Raises:"));
    }

    #[test]
    fn numpy_layout_underlines_headers() {
        let mut routine = add_routine();
        routine.raises.insert("ValueError(\"negative\")".to_string());
        let text = DocstringFormatter::new(DocstringStyle::Numpy).render(&routine, &add_content());
        assert_eq!(
            text,
            "\"\"\"\nAdd two integers.\n\nParameters\n----------\na : int\n    First value.\nb : int\n    Second value.\n\nReturns\n-------\nint\n    Sum.\n\nRaises\n------\nValueError\n    DESCRIPTION\n\"\"\""
        );
    }

    #[test]
    fn rest_layout_uses_field_lists() {
        let content = add_content().raises("OverflowError", "If the sum overflows.");
        let text = DocstringFormatter::new(DocstringStyle::Rest).render(&add_routine(), &content);
        assert_eq!(
            text,
            "\"\"\"\nAdd two integers.\n\n:param a: First value.\n:type a: int\n:param b: Second value.\n:type b: int\n:return: Sum.\n:rtype: int\n:raises OverflowError: If the sum overflows.\n\"\"\""
        );
    }

    #[test]
    fn missing_content_renders_placeholders() {
        let mut routine = RoutineMetadata::new("load", 1);
        routine.args = vec![ArgumentInfo::new("path")];
        routine.returns_value = true;

        let text = DocstringFormatter::new(DocstringStyle::Google)
            .render(&routine, &SemanticContent::default());
        assert!(text.contains("Short description of `load`."));
        assert!(text.contains("    path (TYPE): DESCRIPTION"));
        assert!(text.contains("Returns:\n    TYPE: DESCRIPTION"));
    }

    #[test]
    fn routine_without_return_has_no_returns_block() {
        let mut routine = RoutineMetadata::new("log", 1);
        routine.args = vec![ArgumentInfo::new("msg").with_annotation("str")];
        let text = DocstringFormatter::new(DocstringStyle::Google)
            .render(&routine, &SemanticContent::with_summary("Log a message."));
        assert!(!text.contains("Returns"));
        assert!(text.ends_with("    msg (str): DESCRIPTION\n\"\"\""));
    }

    #[test]
    fn generators_render_yields() {
        let mut routine = RoutineMetadata::new("count", 1);
        routine.args = vec![ArgumentInfo::new("n").with_annotation("int")];
        routine.returns = Some("Iterator[int]".to_string());
        routine.yields = true;
        let content = SemanticContent::with_summary("Count upwards.").returns("Next number.");

        let google = DocstringFormatter::new(DocstringStyle::Google).render(&routine, &content);
        assert!(google.contains("Yields:\n    Iterator[int]: Next number."));
        assert!(!google.contains("Returns:"));

        let numpy = DocstringFormatter::new(DocstringStyle::Numpy).render(&routine, &content);
        assert!(numpy.contains("Yields\n------\nIterator[int]\n    Next number."));

        let rest = DocstringFormatter::new(DocstringStyle::Rest).render(&routine, &content);
        assert!(rest.contains(":return: Next number.\n:rtype: Iterator[int]"));
    }

    #[test]
    fn raises_merge_content_and_extracted_names() {
        let mut routine = RoutineMetadata::new("parse", 1);
        routine.raises.insert("KeyError(key)".to_string());
        routine.raises.insert("ValueError".to_string());
        let content = SemanticContent::with_summary("Parse input.").raises("ValueError", "Bad input.");

        let text = DocstringFormatter::new(DocstringStyle::Google).render(&routine, &content);
        assert!(text.ends_with("Raises:\n    ValueError: Bad input.\n    KeyError: DESCRIPTION\n\"\"\""));
    }

    #[test]
    fn unknown_style_is_rejected() {
        let err = render(&add_routine(), "epytext", &add_content()).unwrap_err();
        assert!(matches!(err, DocsmithError::UnknownStyle { .. }));
    }

    #[test]
    fn rendering_is_deterministic() {
        let routine = add_routine();
        let content = add_content();
        for style in DocstringStyle::ALL {
            let formatter = DocstringFormatter::new(style);
            assert_eq!(formatter.render(&routine, &content), formatter.render(&routine, &content));
        }
    }

    #[test]
    fn rendered_layout_is_detected_back() {
        let routine = add_routine();
        let content = add_content();
        for style in DocstringStyle::ALL {
            let text = DocstringFormatter::new(style).render(&routine, &content);
            assert_eq!(detect_style(&text), Some(style), "{text}");
        }
    }
}
