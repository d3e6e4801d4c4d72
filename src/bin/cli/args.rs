//! CLI Argument Structures
//!
//! This module contains the argument definitions and value enums used by
//! the docsmith binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use docsmith::core::config::DocsmithConfig;
use docsmith::detectors::coverage::{CoverageMode, DocStatus};
use docsmith::docstring::DocstringStyle;
use docsmith::io::reports::DEFAULT_REPORT_PATH;
use docsmith::io::rewrite::RewriteStrategy;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Python docstring coverage and synthesis
#[derive(Parser)]
#[command(name = "docsmith")]
#[command(version = VERSION)]
#[command(about = "📝 Docsmith - Python docstring coverage, generation and rewriting")]
#[command(long_about = "
Measure docstring coverage across a Python tree, list routines whose
docstrings are missing or incomplete for a layout, and write generated
docstrings back into the source.

Common Usage:

  # Coverage report for the current directory
  docsmith scan .

  # Routines that still need a Google-style docstring
  docsmith review ./src --style google

  # Preview a NumPy docstring for one routine
  docsmith generate ./src/pkg/io.py load --style numpy

  # Write it in place
  docsmith apply ./src/pkg/io.py load --style numpy --yes
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to .docsmith.yml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a tree and report docstring coverage
    Scan(ScanArgs),

    /// List routines whose docstrings are missing or incomplete
    Review(ReviewArgs),

    /// Render a docstring for one routine without writing it
    Generate(RoutineArgs),

    /// Render a docstring for one routine and write it into the file
    Apply(ApplyArgs),

    /// Check docstrings with pydocstyle
    Validate(ValidateArgs),

    /// Compute radon complexity and maintainability for a file
    Metrics(MetricsArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),
}

/// Arguments for `scan`
#[derive(Args)]
pub struct ScanArgs {
    /// File or directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Where to write the JSON coverage report
    #[arg(short, long, default_value = DEFAULT_REPORT_PATH)]
    pub out: PathBuf,

    /// Minimum aggregate coverage percentage
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Whether generated previews count toward coverage
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Attach generated docstring previews to undocumented routines
    #[arg(long)]
    pub generate_docs: bool,

    /// Use placeholder content instead of calling the completion service
    #[arg(long)]
    pub offline: bool,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status 1 when the threshold is not met
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `review`
#[derive(Args)]
pub struct ReviewArgs {
    /// File or directory to review
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Target docstring layout
    #[arg(short, long, value_enum)]
    pub style: Option<StyleArg>,

    /// Only routines whose name contains this text
    #[arg(long)]
    pub search: Option<String>,

    /// Only routines with this documentation status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments naming one routine in one file
#[derive(Args)]
pub struct RoutineArgs {
    /// Python source file
    pub file: PathBuf,

    /// Routine name
    pub routine: String,

    /// Target docstring layout
    #[arg(short, long, value_enum)]
    pub style: Option<StyleArg>,

    /// Use placeholder content instead of calling the completion service
    #[arg(long)]
    pub offline: bool,

    /// How the existing docstring is located
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
}

/// Arguments for `apply`
#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub routine: RoutineArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Keep a .bak copy of the file
    #[arg(long)]
    pub backup: bool,
}

/// Arguments for `validate`
#[derive(Args)]
pub struct ValidateArgs {
    /// File or directory to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `metrics`
#[derive(Args)]
pub struct MetricsArgs {
    /// Python source file
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `init-config`
#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".docsmith.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Text,
    /// JSON on stdout
    Json,
    /// CSV on stdout
    Csv,
}

/// Docstring layouts accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Keyword blocks (Args:, Returns:)
    Google,
    /// Underlined sections (Parameters / ----------)
    Numpy,
    /// Field lists (:param x:)
    Rest,
}

impl From<StyleArg> for DocstringStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Google => DocstringStyle::Google,
            StyleArg::Numpy => DocstringStyle::Numpy,
            StyleArg::Rest => DocstringStyle::Rest,
        }
    }
}

/// Coverage modes accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Only docstrings present in the source
    Documented,
    /// Source docstrings plus attached previews
    IncludePreviews,
}

impl From<ModeArg> for CoverageMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Documented => CoverageMode::Documented,
            ModeArg::IncludePreviews => CoverageMode::IncludePreviews,
        }
    }
}

/// Documentation status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Has a docstring
    Documented,
    /// Lacks a docstring
    Undocumented,
}

impl From<StatusArg> for DocStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Documented => DocStatus::Documented,
            StatusArg::Undocumented => DocStatus::Undocumented,
        }
    }
}

/// Rewrite strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Use extracted line numbers
    LineIndex,
    /// Scan a bounded window for quote markers
    BoundedScan,
}

impl From<StrategyArg> for RewriteStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::LineIndex => RewriteStrategy::LineIndex,
            StrategyArg::BoundedScan => RewriteStrategy::BoundedScan,
        }
    }
}

impl RoutineArgs {
    /// Apply routine-level overrides to `config`.
    pub fn apply_overrides(&self, config: &mut DocsmithConfig) {
        if let Some(style) = self.style {
            config.docstring.style = style.into();
        }
        if let Some(strategy) = self.strategy {
            config.rewrite.strategy = strategy.into();
        }
    }
}
