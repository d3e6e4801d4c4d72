//! Error types for the docsmith library.
//!
//! Scanning never fails per unit (parse failures are recorded on the unit
//! itself), so the variants here cover the operations that do surface
//! errors to the caller: configuration, rendering, content generation,
//! rewriting and the external tool seams.

use std::io;
use std::str::Utf8Error;

use thiserror::Error;

/// Main result type for docsmith operations.
pub type Result<T> = std::result::Result<T, DocsmithError>;

/// Error type for all docsmith operations.
#[derive(Error, Debug)]
pub enum DocsmithError {
    /// I/O related errors (file reads, report writes, rewrites)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Parsing and language processing errors
    #[error("Parse error in {language}: {message}")]
    Parse {
        /// Language being parsed
        language: String,
        /// Error description
        message: String,
        /// File path where error occurred
        file_path: Option<String>,
        /// Line number (if available)
        line: Option<usize>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// A docstring layout tag that is not one of the supported styles
    #[error("Unknown docstring style: '{requested}' (expected google, numpy or rest)")]
    UnknownStyle {
        /// The tag that was requested
        requested: String,
    },

    /// Semantic content generation failures
    #[error("Content generation failed: {message}")]
    Generation {
        /// Error description
        message: String,
        /// Raw response body, when one was received
        raw_response: Option<String>,
    },

    /// In-place rewrite failures; the target file is left untouched
    #[error("Rewrite of '{routine}' in {file_path} skipped: {message}")]
    Rewrite {
        /// File that was to be rewritten
        file_path: String,
        /// Routine whose docstring was targeted
        routine: String,
        /// Diagnostic explaining why no write happened
        message: String,
    },

    /// External collaborator (validator, metrics provider) failures
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool {
        /// Executable name
        tool: String,
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl DocsmithError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error
    pub fn parse(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            file_path: None,
            line: None,
        }
    }

    /// Create a new parse error with file context
    pub fn parse_with_location(
        language: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
        line: Option<usize>,
    ) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            file_path: Some(file_path.into()),
            line,
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error naming the offending field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unknown-style error
    pub fn unknown_style(requested: impl Into<String>) -> Self {
        Self::UnknownStyle {
            requested: requested.into(),
        }
    }

    /// Create a new content generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            raw_response: None,
        }
    }

    /// Create a content generation error that keeps the offending response
    pub fn generation_with_response(
        message: impl Into<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self::Generation {
            message: message.into(),
            raw_response: Some(raw_response.into()),
        }
    }

    /// Create a new rewrite error
    pub fn rewrite(
        file_path: impl Into<String>,
        routine: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rewrite {
            file_path: file_path.into(),
            routine: routine.into(),
            message: message.into(),
        }
    }

    /// Create a new external tool error
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. }
            | Self::Generation { message, .. }
            | Self::Serialization { message, .. } => {
                *message = format!("{}: {}", context.into(), message);
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for DocsmithError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for DocsmithError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DocsmithError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<Utf8Error> for DocsmithError {
    fn from(err: Utf8Error) -> Self {
        Self::parse("python", format!("UTF-8 encoding error: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DocsmithError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

/// Conversions for foreign errors that have no `From` impl of their own.
pub trait DocsmithResultExt<T> {
    /// Wrap any displayable error as a generation failure while `action` ran.
    fn map_generic_err(self, action: &str) -> Result<T>;

    /// Wrap a JSON decoding error for the named payload.
    fn map_json_err(self, payload: &str) -> Result<T>;
}

impl<T, E> DocsmithResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn map_generic_err(self, action: &str) -> Result<T> {
        self.map_err(|e| DocsmithError::generation(format!("Error {action}: {e}")))
    }

    fn map_json_err(self, payload: &str) -> Result<T> {
        self.map_err(|e| DocsmithError::Serialization {
            message: format!("Failed to decode {payload}: {e}"),
            data_type: Some("JSON".to_string()),
            source: None,
        })
    }
}
