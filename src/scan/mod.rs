//! Scan evidence
//!
//! License and copyright detection is delegated to a [`ScanOracle`]. This
//! module defines that seam, the per-package [`ScanResults`] it feeds, and the
//! [`ScanResultsProvider`] that the package model asks for those results
//! exactly once.
//!
//! | Oracle            | Backing                                   |
//! |-------------------|-------------------------------------------|
//! | `ScanCodeOracle`  | `scancode` CLI, one JSON report per file  |
//! | `CachingOracle`   | SHA-256 keyed cache around another oracle |
//! | `FixtureOracle`   | in-memory results for tests               |

pub mod cache;
pub mod fixture;
pub mod ignore;
pub mod scancode;

pub use cache::CachingOracle;
pub use fixture::{FixtureOracle, FixtureScanResults};
pub use ignore::IgnoreList;
pub use scancode::ScanCodeOracle;

use crate::package::glob::relative_path;
use crate::package::repo::Repo;
use crate::AuditResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

// ─── Evidence ──────────────────────────────────────────────────────

/// What the oracle reports for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Share of the file that is license text (0-100)
    pub license_text_confidence: f64,
    /// Whether the file is classified as a license text file
    pub is_license_text: bool,
    /// Detected SPDX expression; empty when nothing was found
    pub detected_license_expression: String,
}

impl ScanResult {
    /// Result for a source file carrying a license notice
    pub fn code(expression: &str) -> Self {
        Self {
            license_text_confidence: 0.0,
            is_license_text: false,
            detected_license_expression: expression.to_string(),
        }
    }

    /// Result for a full license text
    pub fn license_text(expression: &str, confidence: f64) -> Self {
        Self {
            license_text_confidence: confidence,
            is_license_text: true,
            detected_license_expression: expression.to_string(),
        }
    }

    /// Identifier recovered from the file's content, if it is a license text
    pub fn spdx_from_license_text(&self) -> Option<&str> {
        if self.is_license_text && !self.detected_license_expression.is_empty() {
            Some(self.detected_license_expression.as_str())
        } else {
            None
        }
    }
}

/// Scan results of one package, split by classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResults {
    /// Non-ignored files that are not license texts
    pub files_with_detected_licenses: BTreeMap<String, ScanResult>,
    /// License text files, package-relative (`../` for repo-level files)
    pub license_text_files: BTreeMap<String, ScanResult>,
}

impl ScanResults {
    /// File the result under the map its classification selects
    pub fn insert(&mut self, rel: String, result: ScanResult) {
        if result.is_license_text {
            self.files_with_detected_licenses.remove(&rel);
            self.license_text_files.insert(rel, result);
        } else {
            self.license_text_files.remove(&rel);
            self.files_with_detected_licenses.insert(rel, result);
        }
    }

    pub fn total_files(&self) -> usize {
        self.files_with_detected_licenses.len() + self.license_text_files.len()
    }
}

// ─── Seams ─────────────────────────────────────────────────────────

/// File-content license and copyright classifier
pub trait ScanOracle: Send + Sync {
    /// License evidence for one file
    fn detect_license(&self, path: &Path) -> AuditResult<ScanResult>;

    /// Copyright statements found in one file
    fn detect_copyrights(&self, path: &Path) -> AuditResult<Vec<String>>;

    /// Identifier for a body of text, when it is confidently a license text
    fn identify_text(&self, text: &str) -> Option<String> {
        let mut tmp = tempfile::NamedTempFile::new().ok()?;
        tmp.write_all(text.as_bytes()).ok()?;
        tmp.flush().ok()?;
        let result = self.detect_license(tmp.path()).ok()?;
        result.spdx_from_license_text().map(str::to_string)
    }
}

impl<T: ScanOracle + ?Sized> ScanOracle for Arc<T> {
    fn detect_license(&self, path: &Path) -> AuditResult<ScanResult> {
        (**self).detect_license(path)
    }

    fn detect_copyrights(&self, path: &Path) -> AuditResult<Vec<String>> {
        (**self).detect_copyrights(path)
    }

    fn identify_text(&self, text: &str) -> Option<String> {
        (**self).identify_text(text)
    }
}

/// Produces a package's scan results; the package model calls it once
pub trait ScanResultsProvider {
    fn collect(&self, package_root: &Path, repo: Option<&Repo>) -> ScanResults;

    /// Copyright statements of one package-relative file
    fn copyrights(&self, package_root: &Path, rel: &str) -> Vec<String>;
}

// ─── Oracle-backed scanner ─────────────────────────────────────────

/// Walks a package and asks the oracle about every non-ignored file
pub struct OracleScanner {
    oracle: Arc<dyn ScanOracle>,
    ignore_patterns: Vec<String>,
}

impl OracleScanner {
    pub fn new(oracle: Arc<dyn ScanOracle>) -> Self {
        Self {
            oracle,
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    fn scannable_files(&self, package_root: &Path) -> Vec<(String, PathBuf)> {
        let ignore = IgnoreList::for_package(package_root, &self.ignore_patterns);
        WalkDir::new(package_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = relative_path(package_root, e.path())?;
                if ignore.is_ignored(&rel) {
                    tracing::debug!("Ignoring {}", rel);
                    None
                } else {
                    Some((rel, e.into_path()))
                }
            })
            .collect()
    }
}

impl ScanResultsProvider for OracleScanner {
    fn collect(&self, package_root: &Path, repo: Option<&Repo>) -> ScanResults {
        let start = Instant::now();
        let files = self.scannable_files(package_root);
        tracing::info!("Scanning {} files in {}", files.len(), package_root.display());

        let scanned: Vec<(String, ScanResult)> = files
            .par_iter()
            .filter_map(|(rel, path)| match self.oracle.detect_license(path) {
                Ok(result) => Some((rel.clone(), result)),
                Err(e) => {
                    tracing::warn!("Scan of {} failed: {}", path.display(), e);
                    None
                }
            })
            .collect();

        let mut results = ScanResults::default();
        for (rel, result) in scanned {
            results.insert(rel, result);
        }

        if let Some(repo) = repo {
            for (rel, result) in repo.license_texts_for_package(package_root, self.oracle.as_ref()) {
                results.license_text_files.insert(rel, result);
            }
        }

        tracing::info!(
            "Scanned {} in {:.0}ms ({} license texts, {} other files)",
            package_root.display(),
            start.elapsed().as_secs_f64() * 1000.0,
            results.license_text_files.len(),
            results.files_with_detected_licenses.len()
        );
        results
    }

    fn copyrights(&self, package_root: &Path, rel: &str) -> Vec<String> {
        let path = package_root.join(rel);
        match self.oracle.detect_copyrights(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Copyright scan of {} failed: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

pub(crate) fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
