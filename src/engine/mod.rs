//! # Audit Engine
//!
//! Orchestrates one run:
//!
//! 1. discover packages under the target path
//! 2. build one [`PackageModel`] per package, sharing the vocabulary, the
//!    scanner, and the [`Repo`] of packages that live in the same repository
//! 3. run the five checks in order through the timed runner
//! 4. aggregate per package and per run, worst status wins
//!
//! Packages are processed sequentially so that reports come out in a stable
//! order; scanning inside a package is parallel.

use crate::checks::{self, CheckContext, CheckOutcome, Status};
use crate::config::AuditConfig;
use crate::license::{LicenseVocabulary, NoReferenceTexts, ReferenceTextProvider, SpdxReferenceTexts};
use crate::package::discovery::find_packages;
use crate::package::{PackageModel, Repo};
use crate::scan::cache::CACHE_FILE_NAME;
use crate::scan::{CachingOracle, OracleScanner, ScanCodeOracle, ScanOracle, ScanResultsProvider};
use crate::AuditResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ─── Exit Codes ────────────────────────────────────────────────────

pub const EX_OK: i32 = 0;
/// No packages found
pub const EX_USAGE: i32 = 64;
/// At least one package failed
pub const EX_DATAERR: i32 = 65;

// ─── Reports ───────────────────────────────────────────────────────

/// Everything the checks concluded about one package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub name: String,
    pub path: PathBuf,
    pub git_hash: Option<String>,
    pub outcomes: Vec<CheckOutcome>,
    pub status: Status,
    pub duration_ms: u64,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub target: PathBuf,
    pub packages: Vec<PackageReport>,
    /// Package path → aggregated status
    pub statuses: BTreeMap<String, Status>,
    pub overall: Status,
    pub duration_ms: u64,
}

impl RunReport {
    fn new(target: &Path, packages: Vec<PackageReport>, duration_ms: u64) -> Self {
        let statuses = packages
            .iter()
            .map(|p| (p.path.display().to_string(), p.status))
            .collect();
        let overall = Status::worst(packages.iter().map(|p| p.status));
        Self {
            target: target.to_path_buf(),
            packages,
            statuses,
            overall,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

// ─── Exit Policy ───────────────────────────────────────────────────

/// Maps a run to a process exit code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    pub warnings_as_errors: bool,
    pub failures_as_warnings: bool,
}

impl ExitPolicy {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            warnings_as_errors: config.warnings_as_errors,
            failures_as_warnings: config.failures_as_warnings,
        }
    }

    /// Status after the configured downgrade/upgrade
    pub fn effective_status(&self, status: Status) -> Status {
        match status {
            Status::Failure if self.failures_as_warnings => Status::Warning,
            Status::Warning if self.warnings_as_errors => Status::Failure,
            other => other,
        }
    }

    pub fn exit_code(&self, report: &RunReport) -> i32 {
        if report.is_empty() {
            return EX_USAGE;
        }
        match self.effective_status(report.overall) {
            Status::Failure => EX_DATAERR,
            Status::Success | Status::Warning => EX_OK,
        }
    }
}

// ─── Auditor ───────────────────────────────────────────────────────

/// Runs the checks over every package under a path
pub struct Auditor {
    config: AuditConfig,
    vocabulary: Arc<LicenseVocabulary>,
    scanner: Arc<dyn ScanResultsProvider>,
    reference_texts: Box<dyn ReferenceTextProvider>,
    scan_cache: Option<Arc<CachingOracle<Arc<dyn ScanOracle>>>>,
}

impl Auditor {
    /// Production auditor: ScanCode oracle, optional scan cache and
    /// reference texts, all per `config`
    pub fn from_config(config: AuditConfig, root: &Path) -> Self {
        let scancode = ScanCodeOracle::new(
            config.scancode.binary.clone(),
            config.scancode.timeout_secs,
            config.license_text_threshold,
        );
        if !scancode.is_available() {
            tracing::warn!(
                "'{}' is not runnable; every file will be reported without findings",
                config.scancode.binary
            );
        }
        let scancode: Arc<dyn ScanOracle> = Arc::new(scancode);

        let (oracle, scan_cache) = if config.scan_cache {
            let cache = Arc::new(CachingOracle::load(scancode, root.join(CACHE_FILE_NAME)));
            (cache.clone() as Arc<dyn ScanOracle>, Some(cache))
        } else {
            (scancode, None)
        };

        let mut auditor = Self::with_oracle(config, oracle);
        auditor.scan_cache = scan_cache;
        if auditor.config.spdx_list.enabled {
            let mut vocabulary = LicenseVocabulary::clone(&auditor.vocabulary);
            vocabulary.merge_spdx_list(&auditor.config.spdx_list.source());
            auditor.vocabulary = Arc::new(vocabulary);
        }
        auditor
    }

    /// Auditor over any oracle, e.g. fixtures. Uses the built-in SPDX table
    /// and never touches the network for it.
    pub fn with_oracle(config: AuditConfig, oracle: Arc<dyn ScanOracle>) -> Self {
        let reference_texts: Box<dyn ReferenceTextProvider> = if config.reference_texts.enabled {
            Box::new(SpdxReferenceTexts::new(
                config.reference_texts.base_url.clone(),
                config.reference_texts.resolved_cache_dir(),
                config.reference_texts.timeout(),
            ))
        } else {
            Box::new(NoReferenceTexts)
        };

        let mut vocabulary = LicenseVocabulary::builtin();
        vocabulary.extend_identifiers(&config.extra_identifiers);

        let scanner = OracleScanner::new(oracle).with_ignore_patterns(config.ignore_patterns.clone());
        Self {
            config,
            vocabulary: Arc::new(vocabulary),
            scanner: Arc::new(scanner),
            reference_texts,
            scan_cache: None,
        }
    }

    pub fn with_reference_texts(mut self, provider: Box<dyn ReferenceTextProvider>) -> Self {
        self.reference_texts = provider;
        self
    }

    pub fn vocabulary(&self) -> &LicenseVocabulary {
        &self.vocabulary
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy::from_config(&self.config)
    }

    /// Audit every package under `path`
    pub fn run(&self, path: &Path) -> AuditResult<RunReport> {
        self.run_with_models(path).map(|(report, _)| report)
    }

    /// Audit every package and keep the models, e.g. for copyright generation
    pub fn run_with_models(&self, path: &Path) -> AuditResult<(RunReport, Vec<PackageModel>)> {
        let start = std::time::Instant::now();
        tracing::info!("═══════════════════════════════════════════════════════");
        tracing::info!("License audit: {}", path.display());
        tracing::info!("═══════════════════════════════════════════════════════");

        let package_paths = find_packages(path)?;
        let mut repos: HashMap<PathBuf, Arc<Repo>> = HashMap::new();
        let mut reports = Vec::with_capacity(package_paths.len());
        let mut models = Vec::with_capacity(package_paths.len());

        for package_path in &package_paths {
            let repo = Repo::discover(package_path).map(|found| {
                repos
                    .entry(found.root().to_path_buf())
                    .or_insert_with(|| Arc::new(found))
                    .clone()
            });
            let model = PackageModel::load(
                package_path,
                self.vocabulary.clone(),
                self.scanner.clone(),
                repo,
            );
            reports.push(self.audit_model(&model));
            models.push(model);
        }

        if let Some(cache) = &self.scan_cache {
            if let Err(e) = cache.save() {
                tracing::warn!("Failed to save scan cache: {}", e);
            }
        }

        let report = RunReport::new(path, reports, start.elapsed().as_millis() as u64);
        tracing::info!(
            "Audit complete: {} packages, overall {} ({}ms)",
            report.packages.len(),
            report.overall,
            report.duration_ms
        );
        Ok((report, models))
    }

    /// Run every check on one package
    pub fn audit_model(&self, model: &PackageModel) -> PackageReport {
        let start = std::time::Instant::now();
        tracing::info!("[{}] {}", model.name(), model.root_path().display());

        let ctx = CheckContext {
            reference_texts: self.reference_texts.as_ref(),
            similarity_threshold: self.config.similarity_threshold,
        };
        let outcomes = checks::run_all(model, &ctx);
        let status = Status::worst(outcomes.iter().map(|o| o.status));
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("[{}] {} ({}ms)", model.name(), status, duration_ms);

        PackageReport {
            name: model.name().to_string(),
            path: model.root_path().to_path_buf(),
            git_hash: model.git_hash().map(str::to_string),
            outcomes,
            status,
            duration_ms,
        }
    }
}
