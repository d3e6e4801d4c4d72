//! # Docsmith: Python Docstring Coverage and Synthesis
//!
//! Docsmith reads Python source with tree-sitter, measures how much of it is
//! documented, and writes style-conformant docstrings back into the files.
//!
//! - **Extraction**: signatures, annotations, defaults, raise and yield
//!   sites, nesting depth and a heuristic complexity per routine
//! - **Coverage**: per-file and aggregate documentation coverage with a
//!   configurable threshold
//! - **Layouts**: Google, NumPy and reStructuredText detection,
//!   completeness checks and deterministic rendering
//! - **Rewriting**: in-place docstring insertion or replacement with a
//!   unified-diff preview
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       API (ReviewEngine)                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core          │  Docstring     │  Oracle       │  I/O       │
//! │ • Scanner      │ • Style        │ • Groq client │ • Reports  │
//! │ • Model        │ • Completeness │ • Prompts     │ • Rewrite  │
//! │ • Config       │ • Formatter    │               │            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Lang (tree-sitter Python)  │  Validation (pydocstyle/radon) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsmith::{compute_default_coverage, scan};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let units = scan("./src")?;
//!     let report = compute_default_coverage(&units);
//!     println!("Coverage: {:.2}%", report.aggregate.coverage_percent);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core data model and traversal
pub mod core {
    //! Core data structures, configuration and source discovery.

    pub mod config;
    pub mod errors;
    pub mod model;
    pub mod scanner;
}

// Coverage aggregation
pub mod detectors {
    //! Documentation coverage detectors.

    pub mod coverage;
}

// Language-specific AST extraction
pub mod lang {
    //! Language-specific parsing and metadata extraction.

    pub mod python;
    pub mod python_literal;
}

// Report persistence and source rewriting
pub mod io {
    //! Report persistence and in-place source rewriting.

    pub mod reports;
    pub mod rewrite;
}

// Docstring layouts
pub mod docstring;

// Semantic content oracle
pub mod oracle;

// External style and metrics tools
pub mod validation;

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
}

// Re-export primary types for convenience
pub use api::engine::ReviewEngine;
pub use core::config::DocsmithConfig;
pub use core::errors::{DocsmithError, DocsmithResultExt, Result};
pub use core::model::{FunctionEntry, RoutineMetadata, UnitMetadata};
pub use core::scanner::{scan, scan_path};
pub use detectors::coverage::{compute_coverage, compute_default_coverage, CoverageReport};
pub use docstring::{detect_style, is_docstring_complete, render, DocstringStyle};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
