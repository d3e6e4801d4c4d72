//! Semantic content consumed by the formatter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::PLACEHOLDER_DESCRIPTION;
use crate::core::model::RoutineMetadata;

/// Descriptions supplied by the content generator.
///
/// Every field is optional on the wire; the formatter fills gaps with
/// placeholders. Maps keep insertion order so rendering is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticContent {
    /// One-line imperative summary
    #[serde(default)]
    pub summary: String,
    /// Argument name to description
    #[serde(default)]
    pub args: IndexMap<String, String>,
    /// Return value description
    #[serde(default)]
    pub returns: String,
    /// Exception name to description
    #[serde(default)]
    pub raises: IndexMap<String, String>,
}

impl SemanticContent {
    /// Content with only a summary.
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Add an argument description.
    pub fn arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.args.insert(name.into(), description.into());
        self
    }

    /// Set the return description.
    pub fn returns(mut self, description: impl Into<String>) -> Self {
        self.returns = description.into();
        self
    }

    /// Add an exception description.
    pub fn raises(mut self, exception: impl Into<String>, description: impl Into<String>) -> Self {
        self.raises.insert(exception.into(), description.into());
        self
    }

    /// Fixed content used when the generator is unavailable or misbehaves.
    pub fn fallback(routine: &RoutineMetadata) -> Self {
        Self {
            summary: default_summary(&routine.name),
            args: routine
                .args
                .iter()
                .map(|arg| (arg.name.clone(), PLACEHOLDER_DESCRIPTION.to_string()))
                .collect(),
            returns: String::new(),
            raises: IndexMap::new(),
        }
    }
}

/// Summary rendered when content supplies none.
pub fn default_summary(name: &str) -> String {
    format!("Short description of `{name}`.")
}
