//! Configuration types and management for docsmith.
//!
//! Every section has a usable default so an absent or partial YAML file is
//! always valid input; `validate` catches values that would make a later
//! stage misbehave.

use std::collections::HashSet;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::errors::{DocsmithError, Result};
use crate::detectors::coverage::CoverageMode;
use crate::docstring::{DocstringStyle, PlaceholderScope};
use crate::io::rewrite::RewriteStrategy;

/// Default documentation coverage threshold, in percent.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 90.0;

/// Default number of lines the bounded rewrite scan inspects.
pub const DEFAULT_SCAN_WINDOW: usize = 50;

/// Environment variable holding the content service credential.
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

static DEFAULT_SKIP_DIRS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["venv", ".venv", "__pycache__", ".git"]);

/// Main configuration for docsmith
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsmithConfig {
    /// Source discovery settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Coverage computation settings
    #[serde(default)]
    pub coverage: CoverageConfig,

    /// Docstring layout and completeness settings
    #[serde(default)]
    pub docstring: DocstringConfig,

    /// Semantic content generator settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// In-place rewrite settings
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl DocsmithConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DocsmithError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            DocsmithError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        self.coverage.validate()?;
        self.generator.validate()?;
        self.rewrite.validate()?;
        Ok(())
    }
}

/// Source discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Directory names pruned from descent
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: HashSet<String>,

    /// Source file extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            skip_dirs: default_skip_dirs(),
            extensions: default_extensions(),
        }
    }
}

impl ScanConfig {
    /// Replace the skip list.
    pub fn with_skip_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable recursion.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Whether a file extension is scanned.
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Validate scan configuration
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(DocsmithError::config_field(
                "at least one source extension is required",
                "scan.extensions",
            ));
        }
        Ok(())
    }
}

/// Coverage computation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Minimum aggregate coverage, in percent
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Whether unapplied previews count as documented
    #[serde(default)]
    pub mode: CoverageMode,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            mode: CoverageMode::default(),
        }
    }
}

impl CoverageConfig {
    /// Validate coverage configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(DocsmithError::config_field(
                format!("threshold must be between 0 and 100, got {}", self.threshold),
                "coverage.threshold",
            ));
        }
        Ok(())
    }
}

/// Docstring layout configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocstringConfig {
    /// Target layout
    #[serde(default)]
    pub style: DocstringStyle,

    /// How far the placeholder check reaches
    #[serde(default)]
    pub placeholder_scope: PlaceholderScope,
}

/// Semantic content generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Chat-completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Environment variable read for the credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl GeneratorConfig {
    /// Validate generator configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DocsmithError::config_field(
                format!("temperature must be between 0 and 2, got {}", self.temperature),
                "generator.temperature",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(DocsmithError::config_field(
                "model must not be empty",
                "generator.model",
            ));
        }
        Ok(())
    }
}

/// In-place rewrite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// How the existing docstring is located
    #[serde(default)]
    pub strategy: RewriteStrategy,

    /// Lines inspected by the bounded scan strategy
    #[serde(default = "default_scan_window")]
    pub scan_window: usize,

    /// Keep a `.bak` copy of every rewritten file
    #[serde(default)]
    pub backup: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            strategy: RewriteStrategy::default(),
            scan_window: DEFAULT_SCAN_WINDOW,
            backup: false,
        }
    }
}

impl RewriteConfig {
    /// Validate rewrite configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan_window == 0 {
            return Err(DocsmithError::config_field(
                "scan_window must be at least 1",
                "rewrite.scan_window",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_skip_dirs() -> HashSet<String> {
    DEFAULT_SKIP_DIRS.iter().map(|dir| dir.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_threshold() -> f64 {
    DEFAULT_COVERAGE_THRESHOLD
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_scan_window() -> usize {
    DEFAULT_SCAN_WINDOW
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_validate() {
        let config = DocsmithConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.coverage.threshold, 90.0);
        assert_eq!(config.rewrite.scan_window, 50);
        assert!(config.scan.skip_dirs.contains("__pycache__"));
        assert_eq!(config.docstring.style, DocstringStyle::Google);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: DocsmithConfig = serde_yaml::from_str(
            r#"
coverage:
  threshold: 75
docstring:
  style: numpy
"#,
        )
        .unwrap();
        assert_eq!(config.coverage.threshold, 75.0);
        assert_eq!(config.docstring.style, DocstringStyle::Numpy);
        assert!(config.scan.recursive);
        assert_eq!(config.generator.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = DocsmithConfig::default();
        config.coverage.threshold = 120.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DocsmithError::Config { field: Some(ref f), .. } if f == "coverage.threshold"));
    }

    #[test]
    fn zero_scan_window_is_rejected() {
        let mut config = DocsmithConfig::default();
        config.rewrite.scan_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docsmith.yml");
        let mut config = DocsmithConfig::default();
        config.docstring.style = DocstringStyle::Rest;
        config.to_yaml_file(&path).unwrap();

        let loaded = DocsmithConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.docstring.style, DocstringStyle::Rest);
        assert_eq!(loaded.coverage.mode, CoverageMode::IncludePreviews);
    }

    #[test]
    fn extension_matching_ignores_dot_and_case() {
        let scan = ScanConfig::default();
        assert!(scan.matches_extension("py"));
        assert!(scan.matches_extension(".PY"));
        assert!(!scan.matches_extension("pyc"));
    }
}
