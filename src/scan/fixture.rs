//! In-memory scan evidence for tests and dry runs

use super::{ScanOracle, ScanResult, ScanResults, ScanResultsProvider};
use crate::package::glob::relative_path;
use crate::package::repo::Repo;
use crate::AuditResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Oracle answering from a table keyed by path relative to `root`.
///
/// Files without an entry scan as "nothing detected".
#[derive(Debug, Clone, Default)]
pub struct FixtureOracle {
    root: PathBuf,
    results: HashMap<String, ScanResult>,
    copyrights: HashMap<String, Vec<String>>,
    texts: HashMap<String, String>,
}

impl FixtureOracle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_result(mut self, rel: &str, result: ScanResult) -> Self {
        self.results.insert(rel.to_string(), result);
        self
    }

    /// Shorthand for a license text file
    pub fn with_license_text(self, rel: &str, id: &str) -> Self {
        self.with_result(rel, ScanResult::license_text(id, 100.0))
    }

    /// Shorthand for a code file with a detected expression
    pub fn with_code(self, rel: &str, expression: &str) -> Self {
        self.with_result(rel, ScanResult::code(expression))
    }

    pub fn with_copyrights(mut self, rel: &str, statements: &[&str]) -> Self {
        self.copyrights.insert(
            rel.to_string(),
            statements.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Identifier returned by `identify_text` for an exact body of text
    pub fn with_text_identity(mut self, text: &str, id: &str) -> Self {
        self.texts.insert(text.to_string(), id.to_string());
        self
    }

    fn key(&self, path: &Path) -> String {
        relative_path(&self.root, path).unwrap_or_else(|| path.to_string_lossy().to_string())
    }
}

impl ScanOracle for FixtureOracle {
    fn detect_license(&self, path: &Path) -> AuditResult<ScanResult> {
        Ok(self.results.get(&self.key(path)).cloned().unwrap_or_default())
    }

    fn detect_copyrights(&self, path: &Path) -> AuditResult<Vec<String>> {
        Ok(self.copyrights.get(&self.key(path)).cloned().unwrap_or_default())
    }

    fn identify_text(&self, text: &str) -> Option<String> {
        self.texts.get(text).cloned()
    }
}

/// Provider returning precomputed results, never touching the filesystem
#[derive(Debug, Clone, Default)]
pub struct FixtureScanResults {
    results: ScanResults,
    copyrights: HashMap<String, Vec<String>>,
}

impl FixtureScanResults {
    pub fn new(results: ScanResults) -> Self {
        Self {
            results,
            copyrights: HashMap::new(),
        }
    }

    pub fn with_copyrights(mut self, rel: &str, statements: &[&str]) -> Self {
        self.copyrights.insert(
            rel.to_string(),
            statements.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl ScanResultsProvider for FixtureScanResults {
    fn collect(&self, _package_root: &Path, _repo: Option<&Repo>) -> ScanResults {
        self.results.clone()
    }

    fn copyrights(&self, _package_root: &Path, rel: &str) -> Vec<String> {
        self.copyrights.get(rel).cloned().unwrap_or_default()
    }
}
