//! Layout detection for existing docstrings.
//!
//! Layouts share vocabulary (a NumPy `Returns` header also contains
//! `returns`), so the checks run in a fixed priority order and the first
//! match wins.

use super::DocstringStyle;

/// Case-insensitive markers of the keyword-block layout.
const GOOGLE_KEYWORDS: &[&str] = &[
    "args:",
    "returns:",
    "raises:",
    "yields:",
    "attributes:",
    "example:",
    "examples:",
    "note:",
    "notes:",
];

/// Case-insensitive markers of the field-list layout.
const REST_KEYWORDS: &[&str] = &[":param", ":type", ":return", ":rtype", ":raises", ":raise"];

/// Classify docstring text, `None` when no layout marker is present.
pub fn detect_style(text: &str) -> Option<DocstringStyle> {
    let doc = text.trim();
    if doc.is_empty() {
        return None;
    }
    let lower = doc.to_lowercase();

    if GOOGLE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(DocstringStyle::Google);
    }

    let dashes = longest_dash_run(doc);
    if (lower.contains("parameters") && dashes >= 10)
        || (lower.contains("returns") && dashes >= 7)
        || dashes >= 8
    {
        return Some(DocstringStyle::Numpy);
    }

    if REST_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(DocstringStyle::Rest);
    }

    None
}

/// Length of the longest run of consecutive `-` characters.
fn longest_dash_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '-' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
