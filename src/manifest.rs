//! `package.xml` reader
//!
//! Only the parts the audit needs are extracted: the package `<name>` and the
//! ordered `<license>` elements with their `file` and `source-files`
//! attributes. Extraction is regex based; the manifest format is flat enough
//! that a full XML parser buys nothing here.

use crate::{AuditError, AuditResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Manifest file name inside every package
pub const MANIFEST_FILE_NAME: &str = "package.xml";

// ─── Regex Patterns ────────────────────────────────────────────────

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static LICENSE_RE: Lazy<Regex> = Lazy::new(|| {
    // <license file="LICENSE" source-files="src/*">MIT</license>
    Regex::new(r"(?s)<license\b([^>]*?)(?:/>|>(.*?)</license\s*>)").unwrap()
});

static ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<name\b[^>]*>(.*?)</name\s*>").unwrap());

// ─── Types ─────────────────────────────────────────────────────────

/// One raw `<license>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLicenseEntry {
    /// Element text, trimmed and entity-decoded
    pub identifier_text: String,
    /// `file` attribute
    pub file: Option<String>,
    /// `source-files` attribute, unsplit
    pub source_files: Option<String>,
}

impl ManifestLicenseEntry {
    pub fn new(identifier_text: &str, file: Option<&str>, source_files: Option<&str>) -> Self {
        Self {
            identifier_text: identifier_text.to_string(),
            file: file.map(str::to_string),
            source_files: source_files.map(str::to_string),
        }
    }
}

/// The parts of a package manifest the audit consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: Option<String>,
    pub licenses: Vec<ManifestLicenseEntry>,
}

impl Manifest {
    /// Read `package.xml` from a package directory
    pub fn from_package_dir(package_root: &Path) -> AuditResult<Self> {
        let path = package_root.join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            AuditError::Manifest(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Extract name and license entries from manifest XML
    pub fn parse(xml: &str) -> AuditResult<Self> {
        let xml = COMMENT_RE.replace_all(xml, "");

        let name = NAME_RE
            .captures(&xml)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str().trim()))
            .filter(|n| !n.is_empty());

        let mut licenses = Vec::new();
        for cap in LICENSE_RE.captures_iter(&xml) {
            let attrs = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let text = cap
                .get(2)
                .map(|m| decode_entities(m.as_str().trim()))
                .unwrap_or_default();
            if text.is_empty() {
                return Err(AuditError::Manifest("license tag must have text".to_string()));
            }

            let mut file = None;
            let mut source_files = None;
            for attr in ATTRIBUTE_RE.captures_iter(attrs) {
                let key = attr.get(1).map(|m| m.as_str()).unwrap_or("");
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                match key {
                    "file" => file = Some(value),
                    "source-files" => source_files = Some(value),
                    _ => {}
                }
            }

            licenses.push(ManifestLicenseEntry {
                identifier_text: text,
                file,
                source_files,
            });
        }

        Ok(Self { name, licenses })
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
