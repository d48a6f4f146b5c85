//! Reconciliation checks
//!
//! Five independent checks read a [`PackageModel`] and each produce a
//! tri-state [`Status`] with a short reason and structured findings.
//!
//! | Check                      | Question                                         |
//! |----------------------------|--------------------------------------------------|
//! | `LicenseTagExistsCheck`    | Does the manifest declare any license?           |
//! | `LicenseTagIsInSpdxListCheck` | Are the declared identifiers recognized?      |
//! | `LicenseTextExistsCheck`   | Does every declaration have a matching text?     |
//! | `LicensesInCodeCheck`      | Is every license found in code declared?         |
//! | `LicenseFilesReferencedCheck` | Is every license text in the package declared? |
//!
//! Checks never abort a run: package errors and panics inside a check are
//! turned into a FAILURE by [`run_check_timed`].

mod code_covered;
mod files_referenced;
mod tag_exists;
mod tag_recognized;
mod text_exists;

use crate::license::{NoReferenceTexts, ReferenceTextProvider};
use crate::package::{Declarations, PackageError, PackageModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Status ────────────────────────────────────────────────────────

/// Verdict severity, ordered SUCCESS < WARNING < FAILURE
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Warning,
    Failure,
}

impl Status {
    /// Worst status of a sequence; SUCCESS when empty
    pub fn worst<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses.into_iter().max().unwrap_or(Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "SUCCESS"),
            Status::Warning => write!(f, "WARNING"),
            Status::Failure => write!(f, "FAILURE"),
        }
    }
}

// ─── Outcome ───────────────────────────────────────────────────────

/// One diagnostic line: which file or tag, and what is wrong with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub entity: String,
    pub reason: String,
}

impl Finding {
    pub fn new(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// What a check concluded, before timing is attached
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub reason: String,
    pub findings: Vec<Finding>,
    pub verbose: Option<String>,
}

impl Verdict {
    pub fn success(reason: impl Into<String>) -> Self {
        Self::with_status(Status::Success, reason)
    }

    pub fn warning(reason: impl Into<String>) -> Self {
        Self::with_status(Status::Warning, reason)
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::with_status(Status::Failure, reason)
    }

    fn with_status(status: Status, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            findings: Vec::new(),
            verbose: None,
        }
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn with_verbose(mut self, verbose: impl Into<String>) -> Self {
        let verbose = verbose.into();
        if !verbose.is_empty() {
            self.verbose = Some(verbose);
        }
        self
    }
}

/// Result of running one check on one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: Check,
    pub status: Status,
    pub reason: String,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<String>,
    pub duration_ms: u64,
}

// ─── Checks ────────────────────────────────────────────────────────

/// The closed set of checks, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Check {
    TagExists,
    TagIsRecognized,
    LicenseTextExists,
    LicensesInCode,
    LicenseFilesReferenced,
}

impl Check {
    pub fn all() -> [Check; 5] {
        [
            Check::TagExists,
            Check::TagIsRecognized,
            Check::LicenseTextExists,
            Check::LicensesInCode,
            Check::LicenseFilesReferenced,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Check::TagExists => "LicenseTagExistsCheck",
            Check::TagIsRecognized => "LicenseTagIsInSpdxListCheck",
            Check::LicenseTextExists => "LicenseTextExistsCheck",
            Check::LicensesInCode => "LicensesInCodeCheck",
            Check::LicenseFilesReferenced => "LicenseFilesReferencedCheck",
        }
    }

    /// Evaluate this check; structural package errors propagate to the runner
    pub fn evaluate(&self, model: &PackageModel, ctx: &CheckContext) -> Result<Verdict, PackageError> {
        match self {
            Check::TagExists => tag_exists::evaluate(model),
            Check::TagIsRecognized => tag_recognized::evaluate(model),
            Check::LicenseTextExists => text_exists::evaluate(model, ctx),
            Check::LicensesInCode => code_covered::evaluate(model),
            Check::LicenseFilesReferenced => files_referenced::evaluate(model),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Shared inputs that do not belong to any one package
pub struct CheckContext<'a> {
    pub reference_texts: &'a dyn ReferenceTextProvider,
    pub similarity_threshold: f64,
}

impl Default for CheckContext<'static> {
    fn default() -> Self {
        Self {
            reference_texts: &NoReferenceTexts,
            similarity_threshold: crate::license::similarity::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

// ─── Runner ────────────────────────────────────────────────────────

/// Run one check with timing, logging, and panic safety
pub fn run_check_timed(check: Check, model: &PackageModel, ctx: &CheckContext) -> CheckOutcome {
    let start = std::time::Instant::now();
    tracing::debug!("→ {} on {}", check, model.name());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| check.evaluate(model, ctx)));
    let duration_ms = start.elapsed().as_millis() as u64;

    let verdict = match result {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            tracing::warn!("{} on {}: {}", check, model.name(), e);
            Verdict::failure(format!("PackageError: {}", e))
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("{} panicked on {}: {}", check, model.name(), msg);
            Verdict::failure(format!("Internal error: {}", msg))
        }
    };

    tracing::debug!("  {} {} ({}ms)", check, verdict.status, duration_ms);
    CheckOutcome {
        check,
        status: verdict.status,
        reason: verdict.reason,
        findings: verdict.findings,
        verbose: verdict.verbose,
        duration_ms,
    }
}

/// Run every check in order
pub fn run_all(model: &PackageModel, ctx: &CheckContext) -> Vec<CheckOutcome> {
    Check::all()
        .into_iter()
        .map(|check| run_check_timed(check, model, ctx))
        .collect()
}

// ─── Shared helpers ────────────────────────────────────────────────

/// Identifier recovered from text → declared identifier, for declarations
/// whose declared identifier is not recognized but whose text was scanned.
pub(crate) fn unofficial_tags(model: &PackageModel, decls: &Declarations) -> BTreeMap<String, String> {
    decls
        .iter()
        .filter(|d| !model.vocabulary().is_recognized(d.identifier.as_str()))
        .filter_map(|d| {
            d.scanned_identifier()
                .map(|scanned| (scanned.to_string(), d.identifier.to_string()))
        })
        .collect()
}

/// `'entity': reason` lines
pub(crate) fn render_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("  '{}': {}", f.entity, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestLicenseEntry;

    #[test]
    fn test_status_ordering() {
        assert!(Status::Success < Status::Warning);
        assert!(Status::Warning < Status::Failure);
        assert_eq!(Status::worst([]), Status::Success);
        assert_eq!(
            Status::worst([Status::Warning, Status::Success, Status::Failure]),
            Status::Failure
        );
        assert_eq!(Status::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_package_error_becomes_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let model = test_support::model(
            dir.path(),
            vec![
                ManifestLicenseEntry::new("MIT", Some("LICENSE"), None),
                ManifestLicenseEntry::new("Zlib", Some("LICENSE.z"), None),
            ],
            &[],
            &[],
        );
        let outcome = run_check_timed(Check::TagExists, &model, &CheckContext::default());
        assert_eq!(outcome.status, Status::Failure);
        assert!(outcome.reason.starts_with("PackageError: There must be at most one"));
    }

    #[test]
    fn test_run_all_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let model = test_support::model(dir.path(), vec![], &[], &[]);
        let outcomes = run_all(&model, &CheckContext::default());
        assert_eq!(
            outcomes.iter().map(|o| o.check).collect::<Vec<_>>(),
            Check::all().to_vec()
        );
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Status::Failure).unwrap(), "\"FAILURE\"");
    }
}
