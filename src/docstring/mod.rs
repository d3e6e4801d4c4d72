//! Docstring layouts: detection, completeness and rendering.
//!
//! Three layouts are supported. The keyword-block layout (Google), the
//! underlined-section layout (NumPy) and the field-list layout
//! (reStructuredText).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::DocsmithError;

pub mod completeness;
pub mod content;
pub mod formatter;
pub mod style;

pub use completeness::{is_docstring_complete, CompletenessJudge, PlaceholderScope};
pub use content::SemanticContent;
pub use formatter::{render, DocstringFormatter};
pub use style::detect_style;

/// Literal placeholder for descriptions not supplied by content.
pub const PLACEHOLDER_DESCRIPTION: &str = "DESCRIPTION";

/// Literal placeholder for unknown types.
pub const PLACEHOLDER_TYPE: &str = "TYPE";

/// A recognised docstring layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocstringStyle {
    /// Keyword blocks such as `Args:` and `Returns:`
    #[default]
    #[serde(alias = "a")]
    Google,
    /// Section headers underlined with dashes
    #[serde(alias = "b")]
    Numpy,
    /// `:param name:` field lists
    #[serde(alias = "c", alias = "restructuredtext", alias = "sphinx")]
    Rest,
}

impl DocstringStyle {
    /// All layouts in detection priority order.
    pub const ALL: [DocstringStyle; 3] = [Self::Google, Self::Numpy, Self::Rest];

    /// Canonical lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Numpy => "numpy",
            Self::Rest => "rest",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Numpy => "NumPy",
            Self::Rest => "reST",
        }
    }
}

impl fmt::Display for DocstringStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocstringStyle {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "a" => Ok(Self::Google),
            "numpy" | "b" => Ok(Self::Numpy),
            "rest" | "restructuredtext" | "sphinx" | "c" => Ok(Self::Rest),
            _ => Err(DocsmithError::unknown_style(s)),
        }
    }
}
