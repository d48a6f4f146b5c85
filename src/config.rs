//! Audit configuration: `.license-audit.toml`
//!
//! Lets a workspace tune ignore patterns, classification thresholds, the
//! recognized-identifier vocabulary, reference-text fetching, the ScanCode
//! invocation and the exit policy. Every field has a default, so an empty or
//! missing file behaves like the stock tool.

use crate::license::reference::DEFAULT_REFERENCE_BASE_URL;
use crate::license::spdx::DEFAULT_SPDX_LIST_URL;
use crate::license::{SpdxListSource, SpdxReferenceTexts};
use crate::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file names looked up in the audited root, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = [".license-audit.toml", "license-audit.toml"];

/// Workspace-level audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// fnmatch-style patterns (package-relative) excluded from scanning
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Minimum license-text score for a file to count as a license text
    #[serde(default = "default_license_text_threshold")]
    pub license_text_threshold: f64,

    /// Minimum similarity for the reference-text fallback
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Identifiers accepted as recognized on top of the SPDX list
    #[serde(default)]
    pub extra_identifiers: Vec<String>,

    #[serde(default)]
    pub spdx_list: SpdxListConfig,

    #[serde(default)]
    pub reference_texts: ReferenceTextsConfig,

    #[serde(default)]
    pub scancode: ScanCodeConfig,

    /// Persist scan results in a content-addressed cache
    #[serde(default)]
    pub scan_cache: bool,

    #[serde(default)]
    pub warnings_as_errors: bool,

    #[serde(default)]
    pub failures_as_warnings: bool,
}

fn default_license_text_threshold() -> f64 {
    99.0
}
fn default_similarity_threshold() -> f64 {
    crate::license::similarity::DEFAULT_SIMILARITY_THRESHOLD
}
fn default_base_url() -> String {
    DEFAULT_REFERENCE_BASE_URL.to_string()
}
fn default_spdx_list_url() -> String {
    DEFAULT_SPDX_LIST_URL.to_string()
}
fn default_true() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_scancode_binary() -> String {
    "scancode".to_string()
}
fn default_scancode_timeout() -> u64 {
    120
}

/// `[spdx_list]` table: the published SPDX list extends the built-in one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpdxListConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_spdx_list_url")]
    pub url: String,
    /// Defaults to the user cache directory
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SpdxListConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_spdx_list_url(),
            cache_dir: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SpdxListConfig {
    pub fn source(&self) -> SpdxListSource {
        SpdxListSource::new(
            self.url.clone(),
            self.cache_dir.clone().unwrap_or_else(SpdxListSource::default_cache_dir),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

/// `[reference_texts]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTextsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Defaults to the user cache directory
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ReferenceTextsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            cache_dir: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ReferenceTextsConfig {
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(SpdxReferenceTexts::default_cache_dir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[scancode]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCodeConfig {
    #[serde(default = "default_scancode_binary")]
    pub binary: String,
    #[serde(default = "default_scancode_timeout")]
    pub timeout_secs: u64,
}

impl Default for ScanCodeConfig {
    fn default() -> Self {
        Self {
            binary: default_scancode_binary(),
            timeout_secs: default_scancode_timeout(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: vec![],
            license_text_threshold: default_license_text_threshold(),
            similarity_threshold: default_similarity_threshold(),
            extra_identifiers: vec![],
            spdx_list: SpdxListConfig::default(),
            reference_texts: ReferenceTextsConfig::default(),
            scancode: ScanCodeConfig::default(),
            scan_cache: false,
            warnings_as_errors: false,
            failures_as_warnings: false,
        }
    }
}

impl AuditConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> AuditResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AuditResult<Self> {
        toml::from_str(content).map_err(|e| AuditError::Config(format!("{}", e)))
    }

    /// Load from the audited root, falling back to defaults
    pub fn from_project_root(root: &Path) -> Self {
        for name in CONFIG_FILE_NAMES {
            let path = root.join(name);
            if !path.is_file() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}; using defaults", path.display(), e);
                }
            }
        }
        tracing::debug!("No configuration file in {}", root.display());
        Self::default()
    }
}
