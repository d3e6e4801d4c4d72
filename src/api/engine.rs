//! Review engine: scan, judge, generate and rewrite for one layout.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::config::DocsmithConfig;
use crate::core::errors::{DocsmithError, Result};
use crate::core::model::{RoutineMetadata, UnitMetadata};
use crate::core::scanner::scan_path;
use crate::detectors::coverage::{
    compute_coverage_with_mode, filter_routines, CoverageReport, DocStatus, RoutineListing,
};
use crate::docstring::{CompletenessJudge, DocstringFormatter, DocstringStyle};
use crate::io::rewrite::{DocstringRewriter, RewriteOutcome};
use crate::lang::python::PythonExtractor;
use crate::oracle::{generate_or_fallback, ContentGenerator, GroqOracle, OracleConfig, PlaceholderGenerator};

/// Main docsmith engine
pub struct ReviewEngine {
    config: Arc<DocsmithConfig>,
    formatter: DocstringFormatter,
    judge: CompletenessJudge,
    generator: Arc<dyn ContentGenerator>,
    rewriter: DocstringRewriter,
}

impl ReviewEngine {
    /// Create an engine with an explicit content generator.
    pub fn new(config: DocsmithConfig, generator: Arc<dyn ContentGenerator>) -> Result<Self> {
        config.validate()?;

        let style = config.docstring.style;
        let engine = Self {
            formatter: DocstringFormatter::new(style),
            judge: CompletenessJudge::new(style).with_scope(config.docstring.placeholder_scope),
            rewriter: DocstringRewriter::from_config(&config.rewrite),
            generator,
            config: Arc::new(config),
        };
        info!("Review engine initialized for {} docstrings", style.display_name());
        Ok(engine)
    }

    /// Create an engine backed by the configured completion service.
    ///
    /// Fails when the credential variable is not set.
    pub fn with_oracle(config: DocsmithConfig) -> Result<Self> {
        let oracle = GroqOracle::new(OracleConfig::from_env(&config.generator)?)?;
        Self::new(config, Arc::new(oracle))
    }

    /// Create an engine that only ever renders placeholder content.
    pub fn offline(config: DocsmithConfig) -> Result<Self> {
        Self::new(config, Arc::new(PlaceholderGenerator))
    }

    /// Engine configuration.
    pub fn config(&self) -> &DocsmithConfig {
        &self.config
    }

    /// Target layout.
    pub fn style(&self) -> DocstringStyle {
        self.formatter.style()
    }

    /// Scan `root` with the configured walker settings.
    pub fn scan(&self, root: &Path) -> Result<Vec<UnitMetadata>> {
        scan_path(root, &self.config.scan)
    }

    /// Coverage under the configured threshold and mode.
    pub fn coverage(&self, units: &[UnitMetadata]) -> CoverageReport {
        compute_coverage_with_mode(
            units,
            self.config.coverage.threshold,
            self.config.coverage.mode,
        )
    }

    /// Routines whose docstring is not complete in the target layout.
    ///
    /// Degraded routines are always listed.
    pub fn review<'a>(
        &self,
        units: &'a [UnitMetadata],
        search: Option<&str>,
        status: Option<DocStatus>,
    ) -> Vec<RoutineListing<'a>> {
        filter_routines(units, search, status)
            .into_iter()
            .filter(|listing| {
                listing
                    .entry
                    .as_routine()
                    .map_or(true, |routine| !self.judge.is_complete(routine))
            })
            .collect()
    }

    /// Whether `routine` already has a complete docstring.
    pub fn is_complete(&self, routine: &RoutineMetadata) -> bool {
        self.judge.is_complete(routine)
    }

    /// Request content for `routine` and render it.
    pub async fn preview(&self, routine: &RoutineMetadata) -> String {
        let content = generate_or_fallback(self.generator.as_ref(), routine).await;
        self.formatter.render(routine, &content)
    }

    /// Fill `generated_docstring` on every undocumented routine. Returns
    /// the number of previews attached.
    pub async fn attach_previews(&self, units: &mut [UnitMetadata]) -> usize {
        let mut attached = 0;
        for unit in units.iter_mut() {
            for entry in &mut unit.functions {
                let Some(routine) = entry.as_routine_mut() else {
                    continue;
                };
                if routine.has_docstring {
                    continue;
                }
                let preview = self.preview(routine).await;
                routine.generated_docstring = Some(preview);
                attached += 1;
            }
            debug!("Attached previews in {}", unit.file_path);
        }
        info!("Attached {} docstring previews", attached);
        attached
    }

    /// Extract `path` and find the routine called `name`.
    ///
    /// When several routines share the name, the first one listed by the
    /// extractor (outermost level first) is returned.
    pub fn locate(&self, path: &Path, name: &str) -> Result<RoutineMetadata> {
        let mut extractor = PythonExtractor::new()?;
        let unit = extractor.extract_file(path);
        if let Some(error) = unit.parsing_errors.first() {
            return Err(DocsmithError::parse_with_location(
                "python",
                format!("{}: {}", error.error_type, error.message),
                unit.file_path.clone(),
                None,
            ));
        }
        unit.find_routine(name).cloned().ok_or_else(|| {
            DocsmithError::validation_field(
                format!("No routine named '{name}' in {}", path.display()),
                "routine",
            )
        })
    }

    /// Show the rewrite `text` would cause, without writing.
    pub fn plan_rewrite(
        &self,
        path: &Path,
        routine: &RoutineMetadata,
        text: &str,
    ) -> Result<RewriteOutcome> {
        self.rewriter.preview(path, routine, text)
    }

    /// Rewrite `routine`'s docstring in `path` with `text`.
    pub fn apply(&self, path: &Path, routine: &RoutineMetadata, text: &str) -> Result<RewriteOutcome> {
        self.rewriter.apply(path, routine, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SOURCE: &str = r#"def documented(a):
    """
    Echo a value.

    Args:
        a (int): Value to echo.

    Returns:
        int: The value.
    """
    return a


def bare(x, y):
    return x * y


def stub(path):
    """Load."""
"#;

    fn engine() -> ReviewEngine {
        ReviewEngine::offline(DocsmithConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = DocsmithConfig::default();
        config.coverage.threshold = 120.0;
        assert!(ReviewEngine::offline(config).is_err());
    }

    #[test]
    fn review_lists_incomplete_routines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("mod.py"), SOURCE).unwrap();

        let engine = engine();
        let units = engine.scan(dir.path()).unwrap();
        let names: Vec<&str> = engine
            .review(&units, None, None)
            .iter()
            .map(|listing| listing.entry.name())
            .collect();
        assert_eq!(names, vec!["bare", "stub"]);

        let undocumented: Vec<&str> = engine
            .review(&units, None, Some(DocStatus::Undocumented))
            .iter()
            .map(|listing| listing.entry.name())
            .collect();
        assert_eq!(undocumented, vec!["bare"]);
    }

    #[tokio::test]
    async fn previews_raise_preview_coverage_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("mod.py"), SOURCE).unwrap();

        let engine = engine();
        let mut units = engine.scan(dir.path()).unwrap();
        let before = engine.coverage(&units);
        assert!((before.aggregate.coverage_percent - 66.67).abs() < 1e-9);

        assert_eq!(engine.attach_previews(&mut units).await, 1);
        let after = engine.coverage(&units);
        assert!((after.aggregate.coverage_percent - 100.0).abs() < 1e-9);
        assert_eq!(after.aggregate.functions_with_docstring, 2);
        assert_eq!(after.aggregate.generated_docstrings, 1);

        let preview = units[0]
            .find_routine("bare")
            .and_then(|r| r.generated_docstring.clone())
            .unwrap();
        assert!(preview.contains("x (TYPE): DESCRIPTION"));
    }

    #[tokio::test]
    async fn apply_makes_routine_documented() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        fs::write(&path, SOURCE).unwrap();

        let engine = engine();
        let routine = engine.locate(&path, "bare").unwrap();
        let text = engine.preview(&routine).await;

        let planned = engine.plan_rewrite(&path, &routine, &text).unwrap();
        assert!(!planned.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);

        let outcome = engine.apply(&path, &routine, &text).unwrap();
        assert!(outcome.written);

        let units = engine.scan(&path).unwrap();
        let report = engine.coverage(&units);
        assert_eq!(report.aggregate.functions_with_docstring, 3);
        assert!(report.aggregate.meets_threshold);
    }

    #[test]
    fn applied_summary_only_docstring_leaves_review() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("net.py");
        fs::write(&path, "def ping():\n    pass\n").unwrap();

        for style in DocstringStyle::ALL {
            let mut config = DocsmithConfig::default();
            config.docstring.style = style;
            let engine = ReviewEngine::offline(config).unwrap();

            let routine = engine.locate(&path, "ping").unwrap();
            let content = crate::docstring::SemanticContent::with_summary("Ping the server.");
            let text = DocstringFormatter::new(style).render(&routine, &content);
            engine.apply(&path, &routine, &text).unwrap();

            let units = engine.scan(&path).unwrap();
            assert!(engine.review(&units, None, None).is_empty(), "{style}");
        }
    }

    #[test]
    fn locate_reports_unknown_routine() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        fs::write(&path, SOURCE).unwrap();

        let err = engine().locate(&path, "missing").unwrap_err();
        assert!(matches!(err, DocsmithError::Validation { .. }));
    }
}
