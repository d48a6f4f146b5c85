//! SPDX license vocabulary
//!
//! The set of identifiers accepted as "recognized" by the tag checks, plus a
//! name ↔ identifier equivalence table so that a manifest declaring
//! `Apache License 2.0` normalizes to `Apache-2.0`.
//!
//! Lookups are exact and case-sensitive. Fuzzy matching is reserved for
//! license *texts* (see [`super::similarity`]).

use super::reference::fetch_text;
use super::LicenseId;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Built-in table of non-deprecated SPDX identifiers and their full names.
static SPDX_LICENSES: &[(&str, &str)] = &[
    ("0BSD", "BSD Zero Clause License"),
    ("AFL-3.0", "Academic Free License v3.0"),
    ("AGPL-3.0-only", "GNU Affero General Public License v3.0 only"),
    ("AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later"),
    ("Apache-1.0", "Apache License 1.0"),
    ("Apache-1.1", "Apache License 1.1"),
    ("Apache-2.0", "Apache License 2.0"),
    ("APSL-2.0", "Apple Public Source License 2.0"),
    ("Artistic-1.0", "Artistic License 1.0"),
    ("Artistic-2.0", "Artistic License 2.0"),
    ("Beerware", "Beerware License"),
    ("BlueOak-1.0.0", "Blue Oak Model License 1.0.0"),
    ("BSD-1-Clause", "BSD 1-Clause License"),
    ("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License"),
    ("BSD-2-Clause-Patent", "BSD-2-Clause Plus Patent License"),
    ("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License"),
    ("BSD-3-Clause-Clear", "BSD 3-Clause Clear License"),
    ("BSD-3-Clause-LBNL", "Lawrence Berkeley National Labs BSD variant license"),
    ("BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License"),
    ("BSL-1.0", "Boost Software License 1.0"),
    ("BUSL-1.1", "Business Source License 1.1"),
    ("CC-BY-3.0", "Creative Commons Attribution 3.0 Unported"),
    ("CC-BY-4.0", "Creative Commons Attribution 4.0 International"),
    ("CC-BY-NC-4.0", "Creative Commons Attribution Non Commercial 4.0 International"),
    ("CC-BY-NC-SA-4.0", "Creative Commons Attribution Non Commercial Share Alike 4.0 International"),
    ("CC-BY-ND-4.0", "Creative Commons Attribution No Derivatives 4.0 International"),
    ("CC-BY-SA-3.0", "Creative Commons Attribution Share Alike 3.0 Unported"),
    ("CC-BY-SA-4.0", "Creative Commons Attribution Share Alike 4.0 International"),
    ("CC0-1.0", "Creative Commons Zero v1.0 Universal"),
    ("CDDL-1.0", "Common Development and Distribution License 1.0"),
    ("CDDL-1.1", "Common Development and Distribution License 1.1"),
    ("CECILL-2.1", "CeCILL Free Software License Agreement v2.1"),
    ("CECILL-B", "CeCILL-B Free Software License Agreement"),
    ("CECILL-C", "CeCILL-C Free Software License Agreement"),
    ("CPAL-1.0", "Common Public Attribution License 1.0"),
    ("CPL-1.0", "Common Public License 1.0"),
    ("curl", "curl License"),
    ("ECL-2.0", "Educational Community License v2.0"),
    ("EFL-2.0", "Eiffel Forum License v2.0"),
    ("EPL-1.0", "Eclipse Public License 1.0"),
    ("EPL-2.0", "Eclipse Public License 2.0"),
    ("EUPL-1.1", "European Union Public License 1.1"),
    ("EUPL-1.2", "European Union Public License 1.2"),
    ("FTL", "Freetype Project License"),
    ("GFDL-1.3-only", "GNU Free Documentation License v1.3 only"),
    ("GFDL-1.3-or-later", "GNU Free Documentation License v1.3 or later"),
    ("GPL-1.0-only", "GNU General Public License v1.0 only"),
    ("GPL-1.0-or-later", "GNU General Public License v1.0 or later"),
    ("GPL-2.0-only", "GNU General Public License v2.0 only"),
    ("GPL-2.0-or-later", "GNU General Public License v2.0 or later"),
    ("GPL-3.0-only", "GNU General Public License v3.0 only"),
    ("GPL-3.0-or-later", "GNU General Public License v3.0 or later"),
    ("HPND", "Historical Permission Notice and Disclaimer"),
    ("ICU", "ICU License"),
    ("IJG", "Independent JPEG Group License"),
    ("IPL-1.0", "IBM Public License v1.0"),
    ("ISC", "ISC License"),
    ("JSON", "JSON License"),
    ("LGPL-2.0-only", "GNU Library General Public License v2 only"),
    ("LGPL-2.0-or-later", "GNU Library General Public License v2 or later"),
    ("LGPL-2.1-only", "GNU Lesser General Public License v2.1 only"),
    ("LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later"),
    ("LGPL-3.0-only", "GNU Lesser General Public License v3.0 only"),
    ("LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later"),
    ("Libpng", "libpng License"),
    ("libpng-2.0", "PNG Reference Library version 2"),
    ("LPPL-1.3c", "LaTeX Project Public License v1.3c"),
    ("MirOS", "The MirOS Licence"),
    ("MIT", "MIT License"),
    ("MIT-0", "MIT No Attribution"),
    ("MIT-CMU", "CMU License"),
    ("MPL-1.1", "Mozilla Public License 1.1"),
    ("MPL-2.0", "Mozilla Public License 2.0"),
    ("MPL-2.0-no-copyleft-exception", "Mozilla Public License 2.0 (no copyleft exception)"),
    ("MS-PL", "Microsoft Public License"),
    ("MS-RL", "Microsoft Reciprocal License"),
    ("MulanPSL-2.0", "Mulan Permissive Software License, Version 2"),
    ("NCSA", "University of Illinois/NCSA Open Source License"),
    ("ODbL-1.0", "Open Data Commons Open Database License v1.0"),
    ("OFL-1.1", "SIL Open Font License 1.1"),
    ("OpenSSL", "OpenSSL License"),
    ("OSL-3.0", "Open Software License 3.0"),
    ("PHP-3.01", "PHP License v3.01"),
    ("PostgreSQL", "PostgreSQL License"),
    ("PSF-2.0", "Python Software Foundation License 2.0"),
    ("Python-2.0", "Python License 2.0"),
    ("Ruby", "Ruby License"),
    ("SGI-B-2.0", "SGI Free Software License B v2.0"),
    ("Sleepycat", "Sleepycat License"),
    ("SSPL-1.0", "Server Side Public License, v 1"),
    ("Unicode-DFS-2016", "Unicode License Agreement - Data Files and Software (2016)"),
    ("Unlicense", "The Unlicense"),
    ("UPL-1.0", "Universal Permissive License v1.0"),
    ("Vim", "Vim License"),
    ("W3C", "W3C Software Notice and License (2002-12-31)"),
    ("WTFPL", "Do What The F*ck You Want To Public License"),
    ("X11", "X11 License"),
    ("Zlib", "zlib License"),
    ("ZPL-2.1", "Zope Public License 2.1"),
];

static BUILTIN: Lazy<LicenseVocabulary> = Lazy::new(|| {
    let mut vocab = LicenseVocabulary::empty();
    for &(id, name) in SPDX_LICENSES {
        vocab.insert(id, Some(name));
    }
    vocab
});

// ─── Vocabulary ─────────────────────────────────────────────────────

/// Recognized license identifiers plus their name equivalences
#[derive(Debug, Clone, Default)]
pub struct LicenseVocabulary {
    ids: HashSet<String>,
    name_to_id: HashMap<String, String>,
}

/// One entry of the official `licenses.json` list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxListEntry {
    license_id: String,
    name: String,
    #[serde(default)]
    is_deprecated_license_id: bool,
}

#[derive(Debug, Deserialize)]
struct SpdxList {
    licenses: Vec<SpdxListEntry>,
}

// ─── Published List ────────────────────────────────────────────────

pub const DEFAULT_SPDX_LIST_URL: &str = "https://spdx.org/licenses/licenses.json";
pub const SPDX_LIST_FILE_NAME: &str = "licenses.json";

/// Read-through disk cache in front of the published SPDX `licenses.json`
#[derive(Debug, Clone)]
pub struct SpdxListSource {
    url: String,
    cache_dir: PathBuf,
    timeout: Duration,
}

impl SpdxListSource {
    pub fn new(url: impl Into<String>, cache_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            cache_dir: cache_dir.into(),
            timeout,
        }
    }

    /// Default cache location under the user's cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ros-license-audit")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(SPDX_LIST_FILE_NAME)
    }

    /// The cached list, or a fresh download that is cached once it parses
    pub fn load(&self) -> Result<String, String> {
        let path = self.cache_path();
        if let Ok(json) = std::fs::read_to_string(&path) {
            tracing::debug!("SPDX license list served from {}", path.display());
            return Ok(json);
        }

        let json = fetch_text(&self.url, self.timeout)?;
        serde_json::from_str::<SpdxList>(&json)
            .map_err(|e| format!("Malformed SPDX license list from {}: {}", self.url, e))?;
        if let Err(e) = std::fs::create_dir_all(&self.cache_dir).and_then(|_| std::fs::write(&path, &json)) {
            tracing::warn!("Failed to cache SPDX license list {}: {}", path.display(), e);
        }
        tracing::info!("Fetched SPDX license list from {}", self.url);
        Ok(json)
    }
}

// ─── Vocabulary ────────────────────────────────────────────────────

impl LicenseVocabulary {
    /// Vocabulary with nothing in it
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in SPDX table
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Add an identifier and, optionally, its full name
    pub fn insert(&mut self, id: &str, name: Option<&str>) {
        self.ids.insert(id.to_string());
        if let Some(name) = name {
            self.name_to_id.insert(name.to_string(), id.to_string());
        }
    }

    /// Accept additional identifiers (e.g. from configuration)
    pub fn extend_identifiers<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.insert(id.as_ref(), None);
        }
    }

    /// Merge the official SPDX `licenses.json`, skipping deprecated ids.
    /// Returns the number of identifiers merged.
    pub fn merge_spdx_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let list: SpdxList = serde_json::from_str(json)?;
        let mut merged = 0usize;
        for entry in list.licenses.iter().filter(|e| !e.is_deprecated_license_id) {
            self.insert(&entry.license_id, Some(&entry.name));
            merged += 1;
        }
        Ok(merged)
    }

    /// Merge the published SPDX list from `source`. The vocabulary is left
    /// as it was when the list cannot be loaded. Returns the number merged.
    pub fn merge_spdx_list(&mut self, source: &SpdxListSource) -> usize {
        let json = match source.load() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("SPDX license list unavailable, using the built-in table: {}", e);
                return 0;
            }
        };
        match self.merge_spdx_json(&json) {
            Ok(n) => {
                tracing::debug!("Merged {} SPDX ids from {}", n, source.cache_path().display());
                n
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", source.cache_path().display(), e);
                0
            }
        }
    }

    /// Whether `text` is a recognized identifier or a recognized full name
    pub fn is_recognized(&self, text: &str) -> bool {
        self.ids.contains(text) || self.name_to_id.contains_key(text)
    }

    /// Map a declared license name to its canonical identifier.
    ///
    /// Unknown names are kept verbatim; the tag checks report them.
    pub fn normalize(&self, text: &str) -> LicenseId {
        if self.ids.contains(text) {
            return LicenseId::new(text);
        }
        match self.name_to_id.get(text) {
            Some(id) => LicenseId::new(id.as_str()),
            None => LicenseId::new(text),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
