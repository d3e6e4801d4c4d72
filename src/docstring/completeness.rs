//! Completeness judgement for existing docstrings.

use serde::{Deserialize, Serialize};

use super::style::detect_style;
use super::{DocstringStyle, PLACEHOLDER_DESCRIPTION};
use crate::core::model::RoutineMetadata;

/// Minimum trimmed length of a docstring that can be complete.
pub const MIN_DOCSTRING_LEN: usize = 10;

/// How much of the text the placeholder check inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderScope {
    /// Any placeholder anywhere in the text makes it incomplete.
    #[default]
    Global,
    /// Only the parameter section, from its marker onward, is inspected.
    Section,
}

/// Decides whether a routine's docstring already satisfies a layout.
#[derive(Debug, Clone, Copy)]
pub struct CompletenessJudge {
    style: DocstringStyle,
    scope: PlaceholderScope,
}

impl CompletenessJudge {
    /// Judge against `style` with the global placeholder check.
    pub fn new(style: DocstringStyle) -> Self {
        Self {
            style,
            scope: PlaceholderScope::Global,
        }
    }

    /// Select the placeholder scope.
    pub fn with_scope(mut self, scope: PlaceholderScope) -> Self {
        self.scope = scope;
        self
    }

    /// Target layout.
    pub fn style(&self) -> DocstringStyle {
        self.style
    }

    /// Whether the routine's docstring is complete in the target layout.
    pub fn is_complete(&self, routine: &RoutineMetadata) -> bool {
        if !routine.has_docstring {
            return false;
        }
        let Some(text) = routine.docstring.as_deref() else {
            return false;
        };
        self.check(text, !has_sections(routine))
    }

    /// Apply the checks to raw docstring text.
    pub fn is_text_complete(&self, text: &str) -> bool {
        self.check(text, false)
    }

    /// `summary_only` accepts text without any layout marker, for routines
    /// whose rendering has no sections to carry one.
    fn check(&self, text: &str, summary_only: bool) -> bool {
        if text.trim().chars().count() < MIN_DOCSTRING_LEN {
            return false;
        }

        match detect_style(text) {
            Some(style) if style == self.style => {}
            None if summary_only => {}
            _ => return false,
        }

        let lower = text.to_lowercase();
        let placeholder = PLACEHOLDER_DESCRIPTION.to_lowercase();
        match self.scope {
            PlaceholderScope::Global => !lower.contains(&placeholder),
            PlaceholderScope::Section => match lower.find(section_marker(self.style)) {
                Some(offset) => !lower[offset..].contains(&placeholder),
                None => true,
            },
        }
    }
}

/// Whether any argument, return, yield or raise section would be rendered.
fn has_sections(routine: &RoutineMetadata) -> bool {
    !routine.args.is_empty()
        || routine.documents_return()
        || routine.yields
        || !routine.raises.is_empty()
}

/// Marker opening the parameter section of a layout.
fn section_marker(style: DocstringStyle) -> &'static str {
    match style {
        DocstringStyle::Google => "args:",
        DocstringStyle::Numpy => "parameters",
        DocstringStyle::Rest => ":param",
    }
}

/// Global-scope completeness check.
pub fn is_docstring_complete(routine: &RoutineMetadata, style: DocstringStyle) -> bool {
    CompletenessJudge::new(style).is_complete(routine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented(text: &str) -> RoutineMetadata {
        let mut routine = RoutineMetadata::new("f", 1);
        routine.has_docstring = !text.trim().is_empty();
        routine.docstring = Some(text.to_string());
        routine
    }

    #[test]
    fn complete_google_docstring() {
        let routine = documented("Add numbers.\n\nArgs:\n    a (int): First value.");
        assert!(is_docstring_complete(&routine, DocstringStyle::Google));
        assert!(!is_docstring_complete(&routine, DocstringStyle::Numpy));
    }

    #[test]
    fn missing_or_short_docstrings_are_incomplete() {
        let mut routine = RoutineMetadata::new("f", 1);
        assert!(!is_docstring_complete(&routine, DocstringStyle::Google));

        routine = documented("Args: x");
        assert!(!is_docstring_complete(&routine, DocstringStyle::Google));
    }

    #[test]
    fn plain_summary_is_incomplete_in_every_layout() {
        let mut routine = documented("Add two numbers together.");
        routine.args.push(crate::core::model::ArgumentInfo::new("a"));
        for style in DocstringStyle::ALL {
            assert!(!is_docstring_complete(&routine, style));
        }
    }

    #[test]
    fn summary_only_is_complete_when_nothing_else_applies() {
        let routine = documented("Ping the server.");
        for style in DocstringStyle::ALL {
            assert!(is_docstring_complete(&routine, style));
        }

        let placeholder = documented("Short description of `ping`. DESCRIPTION");
        assert!(!is_docstring_complete(&placeholder, DocstringStyle::Google));

        let mut with_arg = documented("Ping the server.");
        with_arg.args.push(crate::core::model::ArgumentInfo::new("host"));
        assert!(!is_docstring_complete(&with_arg, DocstringStyle::Google));

        let mut generator = documented("Ping the server.");
        generator.yields = true;
        assert!(!is_docstring_complete(&generator, DocstringStyle::Rest));
    }

    #[test]
    fn placeholder_anywhere_is_incomplete() {
        let routine = documented("Short description.\n\nArgs:\n    a (TYPE): description");
        assert!(!is_docstring_complete(&routine, DocstringStyle::Google));

        let summary_placeholder =
            documented("DESCRIPTION here.\n\n:param a: First value.\n:type a: int");
        assert!(!is_docstring_complete(&summary_placeholder, DocstringStyle::Rest));
    }

    #[test]
    fn section_scope_only_inspects_parameter_section() {
        let judge = CompletenessJudge::new(DocstringStyle::Rest).with_scope(PlaceholderScope::Section);
        assert!(judge.is_text_complete("DESCRIPTION here.\n\n:param a: First value."));
        assert!(!judge.is_text_complete("Summary here.\n\n:param a: DESCRIPTION"));

        let numpy = CompletenessJudge::new(DocstringStyle::Numpy).with_scope(PlaceholderScope::Section);
        assert!(numpy.is_text_complete("Description pending.\n\nReturns\n-------\nint"));
        assert!(!numpy.is_text_complete("Summary.\n\nParameters\n----------\na : int\n    description"));
    }

    #[test]
    fn scope_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&PlaceholderScope::Section).unwrap(),
            "\"section\""
        );
    }
}
