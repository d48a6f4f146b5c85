//! Canonical license texts
//!
//! Fetches the SPDX reference text for an identifier and keeps it in a local
//! cache directory keyed by identifier. Every failure degrades to "no text
//! available"; callers then simply skip the similarity comparison.

use super::LicenseId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the SPDX project publishes plain-text license bodies
pub const DEFAULT_REFERENCE_BASE_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/main/text";

/// Source of canonical license texts
pub trait ReferenceTextProvider: Send + Sync {
    /// Canonical text for `id`, or `None` when it cannot be obtained
    fn reference_text(&self, id: &LicenseId) -> Option<String>;
}

// ─── Disabled ──────────────────────────────────────────────────────

/// Provider used when reference texts are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceTexts;

impl ReferenceTextProvider for NoReferenceTexts {
    fn reference_text(&self, _id: &LicenseId) -> Option<String> {
        None
    }
}

// ─── In-memory ─────────────────────────────────────────────────────

/// Fixed set of texts, for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceTexts {
    texts: HashMap<String, String>,
}

impl InMemoryReferenceTexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, text: &str) -> Self {
        self.texts.insert(id.to_string(), text.to_string());
        self
    }
}

impl ReferenceTextProvider for InMemoryReferenceTexts {
    fn reference_text(&self, id: &LicenseId) -> Option<String> {
        self.texts.get(id.as_str()).cloned()
    }
}

// ─── SPDX (network + disk cache) ───────────────────────────────────

/// Read-through disk cache in front of the SPDX license-list-data repository
pub struct SpdxReferenceTexts {
    base_url: String,
    cache_dir: PathBuf,
    timeout: Duration,
}

impl SpdxReferenceTexts {
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: cache_dir.into(),
            timeout,
        }
    }

    /// Default cache location under the user's cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ros-license-audit")
            .join("texts")
    }

    fn cache_path(&self, id: &LicenseId) -> Option<PathBuf> {
        // Identifiers become file names; refuse anything that could escape the cache dir
        let valid = !id.is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+'))
            && !id.as_str().starts_with('.');
        if valid {
            Some(self.cache_dir.join(format!("{}.txt", id)))
        } else {
            None
        }
    }

    fn fetch(&self, id: &LicenseId) -> Result<String, String> {
        let url = format!("{}/{}.txt", self.base_url.trim_end_matches('/'), id);
        fetch_text(&url, self.timeout)
    }

    fn store(&self, path: &Path, text: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::write(path, text)
    }
}

/// GET `url` as text, failing on any non-2xx status
pub(crate) fn fetch_text(url: &str, timeout: Duration) -> Result<String, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!("HTTP {} for {}", response.status(), url));
    }
    response
        .text()
        .map_err(|e| format!("Failed to read response from {}: {}", url, e))
}

impl ReferenceTextProvider for SpdxReferenceTexts {
    fn reference_text(&self, id: &LicenseId) -> Option<String> {
        let path = self.cache_path(id)?;
        if let Ok(text) = std::fs::read_to_string(&path) {
            tracing::debug!("Reference text for {} served from {}", id, path.display());
            return Some(text);
        }

        match self.fetch(id) {
            Ok(text) => {
                if let Err(e) = self.store(&path, &text) {
                    tracing::warn!("Failed to cache reference text {}: {}", path.display(), e);
                }
                tracing::info!("Fetched reference text for {}", id);
                Some(text)
            }
            Err(e) => {
                tracing::warn!("No reference text for {}: {}", id, e);
                None
            }
        }
    }
}
