//! Source discovery and batch extraction.
//!
//! A scan never aborts on a single bad unit: failures are recorded on the
//! unit's `parsing_errors`. The only fatal condition is a root that does
//! not exist.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::config::ScanConfig;
use crate::core::errors::{DocsmithError, Result};
use crate::core::model::UnitMetadata;
use crate::lang::python::PythonExtractor;

/// Scan `root` with the default settings.
pub fn scan(root: impl AsRef<Path>) -> Result<Vec<UnitMetadata>> {
    scan_path(root.as_ref(), &ScanConfig::default())
}

/// Discover source units under `root` and extract each one.
pub fn scan_path(root: &Path, config: &ScanConfig) -> Result<Vec<UnitMetadata>> {
    let files = discover_sources(root, config)?;
    let mut extractor = PythonExtractor::new()?;

    let units: Vec<UnitMetadata> = files
        .iter()
        .map(|path| {
            debug!("Scanning {}", path.display());
            extractor.extract_file(path)
        })
        .collect();

    let failed = units.iter().filter(|unit| unit.has_parsing_errors()).count();
    info!(
        "Scanned {} source files under {} ({} with parsing errors)",
        units.len(),
        root.display(),
        failed
    );
    Ok(units)
}

/// List the source files a scan of `root` would visit, in traversal order.
pub fn discover_sources(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        DocsmithError::io(format!("Cannot scan {}", root.display()), e)
    })?;

    if metadata.is_file() {
        return Ok(if is_source_file(root, config) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let max_depth = if config.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, config));

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_source_file(entry.path(), config) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }

    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry, config: &ScanConfig) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.skip_dirs.contains(name))
}

fn is_source_file(path: &Path, config: &ScanConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.matches_extension(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join(".venv/lib")).unwrap();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::write(root.join("b.py"), "def b():\n    pass\n").unwrap();
        fs::write(root.join("a.py"), "def a():\n    pass\n").unwrap();
        fs::write(root.join("notes.txt"), "not python").unwrap();
        fs::write(root.join("pkg/mod.py"), "def m():\n    pass\n").unwrap();
        fs::write(root.join("pkg/sub/deep.py"), "def d():\n    pass\n").unwrap();
        fs::write(root.join(".venv/lib/site.py"), "def s():\n    pass\n").unwrap();
        fs::write(root.join("__pycache__/cached.py"), "def c():\n    pass\n").unwrap();
        dir
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn recursive_discovery_prunes_skip_dirs_in_sorted_order() {
        let dir = fixture();
        let files = discover_sources(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(
            names(&files, dir.path()),
            vec!["a.py", "b.py", "pkg/mod.py", "pkg/sub/deep.py"]
        );
    }

    #[test]
    fn non_recursive_discovery_stays_at_top_level() {
        let dir = fixture();
        let config = ScanConfig::default().with_recursive(false);
        let files = discover_sources(dir.path(), &config).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["a.py", "b.py"]);
    }

    #[test]
    fn custom_skip_dirs_replace_defaults() {
        let dir = fixture();
        let config = ScanConfig::default().with_skip_dirs(["pkg"]);
        let files = discover_sources(dir.path(), &config).unwrap();
        let found = names(&files, dir.path());
        assert!(found.contains(&".venv/lib/site.py".to_string()));
        assert!(!found.iter().any(|f| f.starts_with("pkg/")));
    }

    #[test]
    fn single_file_roots() {
        let dir = fixture();
        let units = scan(dir.path().join("a.py")).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].functions[0].name(), "a");

        assert!(scan(dir.path().join("notes.txt")).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = scan(dir.path().join("nowhere")).unwrap_err();
        assert!(matches!(err, DocsmithError::Io { .. }));
    }

    #[test]
    fn bad_units_do_not_abort_the_batch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_broken.py"), "def broken(:\n    pass\n").unwrap();
        fs::write(
            dir.path().join("b_good.py"),
            "def good(x):\n    \"\"\"Return x.\"\"\"\n    return x\n",
        )
        .unwrap();

        let units = scan(dir.path()).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units[0].has_parsing_errors());
        assert!(units[0].functions.is_empty());
        assert!(units[1].parsing_errors.is_empty());
        assert!(units[1].functions[0].has_docstring());
    }
}
