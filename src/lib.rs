//! # ros-license-audit — License Declaration Reconciliation
//!
//! Audits ROS packages for correct license declaration. The manifest's
//! `<license>` tags are cross-checked against the license text files in the
//! package (or its repository) and against licenses detected by scanning
//! every source file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Auditor                            │
//! │  ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌─────────┐  │
//! │  │ Discovery │  │ AuditConfig│  │ Vocabulary │  │Reference│  │
//! │  │ (walkdir) │  │   (toml)   │  │   (SPDX)   │  │  Texts  │  │
//! │  └─────┬─────┘  └─────┬──────┘  └─────┬──────┘  └────┬────┘  │
//! │        │              │               │              │       │
//! │  ┌─────▼──────────────▼───────────────▼──────────────▼────┐  │
//! │  │ PackageModel: manifest → declarations → scan results   │  │
//! │  │  (remainder owner, text-file inference, memoized scan) │  │
//! │  └──────────────────────────┬─────────────────────────────┘  │
//! │  ┌──────────────────────────▼─────────────────────────────┐  │
//! │  │ Checks: TagExists │ TagIsRecognized │ LicenseText      │  │
//! │  │         LicensesInCode │ LicenseFilesReferenced        │  │
//! │  └──────────────────────────┬─────────────────────────────┘  │
//! │                Status aggregation → RunReport                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scanning is delegated to a [`scan::ScanOracle`] (ScanCode in production,
//! fixtures in tests).

pub mod checks;
pub mod config;
pub mod copyright;
pub mod engine;
pub mod license;
pub mod manifest;
pub mod package;
pub mod report;
pub mod scan;

pub use checks::{Check, CheckOutcome, Finding, Status};
pub use config::AuditConfig;
pub use engine::{Auditor, ExitPolicy, PackageReport, RunReport};
pub use license::{LicenseId, LicenseVocabulary};
pub use package::{LicenseDeclaration, PackageError, PackageModel};
pub use scan::{ScanOracle, ScanResult, ScanResults, ScanResultsProvider};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Scanner error: {0}")]
    Scanner(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reference text error: {0}")]
    ReferenceText(String),

    #[error("Package discovery error: {0}")]
    Discovery(String),

    #[error("Cannot create copyright file: {0}")]
    Copyright(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
