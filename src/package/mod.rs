//! Package model
//!
//! A [`PackageModel`] ties together what the manifest declares and what the
//! scanner finds. Both halves are computed lazily and at most once:
//!
//! 1. **Scan results** come from the injected [`ScanResultsProvider`] on
//!    first access and are kept for the lifetime of the model.
//! 2. **Declarations** are resolved on first access: identifiers are
//!    normalized, repeated identifiers collapse, the remainder owner gets
//!    every file nobody else claims, and a missing text-file link is inferred
//!    from the scan. Structural violations become a [`PackageError`] that is
//!    memoized too, so every check sees the same failure.

pub mod declaration;
pub mod discovery;
pub mod glob;
pub mod repo;

pub use declaration::{Declarations, LicenseDeclaration};
pub use repo::Repo;

use crate::license::{LicenseId, LicenseVocabulary};
use crate::manifest::{Manifest, ManifestLicenseEntry};
use crate::scan::{ScanResult, ScanResults, ScanResultsProvider};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Structural problems that make a package's declarations unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    #[error("There must be at most one license tag without source-files.")]
    MoreThanOneLicenseWithoutSourceFiles,

    #[error("There must be at most one license tag without a license text file.")]
    MoreThanOneLicenseWithoutLicenseTextFile,

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Invalid source-files glob: {0}")]
    InvalidGlob(String),
}

/// Markers that make a top-level file a license text candidate by name
const LICENSE_NAME_MARKERS: [&str; 2] = ["LICENSE", "COPYING"];

/// One ROS package under audit
pub struct PackageModel {
    root_path: PathBuf,
    name: String,
    repo: Option<Arc<Repo>>,
    manifest: Result<Manifest, PackageError>,
    vocabulary: Arc<LicenseVocabulary>,
    scanner: Arc<dyn ScanResultsProvider>,
    scan_results: OnceCell<ScanResults>,
    declarations: OnceCell<Result<Declarations, PackageError>>,
}

impl PackageModel {
    /// Model for the package at `root_path`, reading its `package.xml`
    pub fn load(
        root_path: &Path,
        vocabulary: Arc<LicenseVocabulary>,
        scanner: Arc<dyn ScanResultsProvider>,
        repo: Option<Arc<Repo>>,
    ) -> Self {
        let manifest = Manifest::from_package_dir(root_path).map_err(|e| {
            tracing::warn!("{}: {}", root_path.display(), e);
            PackageError::Manifest(e.to_string())
        });
        let name = manifest
            .as_ref()
            .ok()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| dir_name(root_path));
        Self {
            root_path: root_path.to_path_buf(),
            name,
            repo,
            manifest,
            vocabulary,
            scanner,
            scan_results: OnceCell::new(),
            declarations: OnceCell::new(),
        }
    }

    /// Model from already-read manifest entries
    pub fn from_entries(
        root_path: &Path,
        entries: Vec<ManifestLicenseEntry>,
        vocabulary: Arc<LicenseVocabulary>,
        scanner: Arc<dyn ScanResultsProvider>,
    ) -> Self {
        Self {
            root_path: root_path.to_path_buf(),
            name: dir_name(root_path),
            repo: None,
            manifest: Ok(Manifest {
                name: None,
                licenses: entries,
            }),
            vocabulary,
            scanner,
            scan_results: OnceCell::new(),
            declarations: OnceCell::new(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo(&self) -> Option<&Repo> {
        self.repo.as_deref()
    }

    pub fn git_hash(&self) -> Option<&str> {
        self.repo().and_then(Repo::git_hash)
    }

    pub fn vocabulary(&self) -> &LicenseVocabulary {
        &self.vocabulary
    }

    // ─── Scan Results ──────────────────────────────────────────────

    /// Scan results, computed on first call only
    pub fn scan_results(&self) -> &ScanResults {
        self.scan_results.get_or_init(|| {
            tracing::debug!("Collecting scan results for {}", self.name);
            self.scanner.collect(&self.root_path, self.repo.as_deref())
        })
    }

    pub fn files_with_detected_licenses(&self) -> &BTreeMap<String, ScanResult> {
        &self.scan_results().files_with_detected_licenses
    }

    pub fn license_text_files(&self) -> &BTreeMap<String, ScanResult> {
        &self.scan_results().license_text_files
    }

    /// Copyright statements of one package-relative file
    pub fn copyrights(&self, rel: &str) -> Vec<String> {
        self.scanner.copyrights(&self.root_path, rel)
    }

    // ─── Declarations ──────────────────────────────────────────────

    /// Resolved declarations, or the structural error that prevents them
    pub fn declarations(&self) -> Result<&Declarations, PackageError> {
        self.declarations
            .get_or_init(|| self.resolve_declarations())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn resolve_declarations(&self) -> Result<Declarations, PackageError> {
        let manifest = self.manifest.as_ref().map_err(Clone::clone)?;

        let parsed = manifest
            .licenses
            .iter()
            .map(|entry| {
                let mut decl = LicenseDeclaration::new(self.vocabulary.normalize(&entry.identifier_text));
                decl.text_file = entry.file.clone().filter(|f| !f.trim().is_empty());
                decl.remainder_owner = glob::is_remainder_pattern(entry.source_files.as_deref());
                if !decl.remainder_owner {
                    decl.source_files_str = entry.source_files.clone().unwrap_or_default();
                }
                decl
            })
            .collect();
        let mut decls = Declarations::from_ordered(parsed);

        // Structural checks run before anything is inferred
        if decls.iter().filter(|d| d.remainder_owner).count() > 1 {
            return Err(PackageError::MoreThanOneLicenseWithoutSourceFiles);
        }
        if decls.iter().filter(|d| d.text_file.is_none()).count() > 1 {
            return Err(PackageError::MoreThanOneLicenseWithoutLicenseTextFile);
        }

        self.resolve_owned_files(&mut decls)?;

        let texts = self.license_text_files();
        for decl in decls.iter_mut() {
            if decl.text_file.is_none() {
                decl.text_file = self.infer_text_file(texts);
                if let Some(inferred) = &decl.text_file {
                    tracing::debug!("{}: {} linked to {}", self.name, decl.identifier, inferred);
                }
            }
            if let Some(result) = decl.text_file.as_ref().and_then(|f| texts.get(f)) {
                decl.identifier_from_scanned_text = Some(result.detected_license_expression.clone());
            }
        }

        // A single tag and a single license text belong together
        if decls.len() == 1 && texts.len() == 1 {
            if let (Some(decl), Some(result)) = (decls.iter_mut().next(), texts.values().next()) {
                if decl.identifier_from_scanned_text.is_none() {
                    decl.identifier_from_scanned_text = Some(result.detected_license_expression.clone());
                }
            }
        }

        tracing::debug!("{}: resolved {} declarations", self.name, decls.len());
        Ok(decls)
    }

    fn resolve_owned_files(&self, decls: &mut Declarations) -> Result<(), PackageError> {
        let mut claimed: BTreeMap<String, LicenseId> = BTreeMap::new();
        for decl in decls.iter_mut().filter(|d| !d.remainder_owner) {
            let files = glob::resolve_globs(&decl.source_files_str, &self.root_path)?;
            let overlap: Vec<String> = files
                .iter()
                .filter_map(|f| claimed.get(f).map(|other| format!("'{}' ({})", f, other)))
                .collect();
            if !overlap.is_empty() {
                tracing::warn!(
                    "{}: source-files of {} overlap earlier license tags: {}",
                    self.name,
                    decl.identifier,
                    overlap.join(", ")
                );
            }
            for f in &files {
                claimed.entry(f.clone()).or_insert_with(|| decl.identifier.clone());
            }
            decl.owned_files = Some(files);
        }
        if let Some(remainder) = decls.iter_mut().find(|d| d.remainder_owner) {
            let all = glob::all_files(&self.root_path);
            remainder.owned_files = Some(all.into_iter().filter(|f| !claimed.contains_key(f)).collect());
        }
        Ok(())
    }

    fn infer_text_file(&self, texts: &BTreeMap<String, ScanResult>) -> Option<String> {
        // The package's own texts win over repository-level ones
        let (own, shared): (Vec<&String>, Vec<&String>) = texts.keys().partition(|p| !is_repo_level(p));
        if own.len() == 1 {
            return Some(own[0].clone());
        }
        if own.is_empty() && shared.len() == 1 {
            return Some(shared[0].clone());
        }
        if let Some(path) = own.iter().chain(shared.iter()).find(|p| p.contains("LICENSE")) {
            return Some((*path).clone());
        }

        // Nothing recognized by content; fall back to a unique conventional name
        let candidates: Vec<String> = std::fs::read_dir(&self.root_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .filter(|n| LICENSE_NAME_MARKERS.iter().any(|m| n.contains(m)))
                    .collect()
            })
            .unwrap_or_default();
        if candidates.len() == 1 {
            candidates.into_iter().next()
        } else {
            None
        }
    }

}

/// Repository-level text keys carry one `..` component per level
pub fn is_repo_level(path: &str) -> bool {
    path.split('/').any(|c| c == "..")
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
