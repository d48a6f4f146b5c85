//! Normalized license declarations

use crate::license::LicenseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One `<license>` entry after normalization and inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseDeclaration {
    /// SPDX identifier when resolvable, otherwise the declared text
    pub identifier: LicenseId,
    /// Package-relative path of the license text, declared or inferred
    pub text_file: Option<String>,
    /// Files this license covers; `None` only while unresolved
    pub owned_files: Option<BTreeSet<String>>,
    /// Raw `source-files` value (`*` for the remainder owner)
    pub source_files_str: String,
    /// Identifier the scanner recovered from the text file's content
    pub identifier_from_scanned_text: Option<String>,
    /// Owns every file no other declaration claims
    pub remainder_owner: bool,
}

impl LicenseDeclaration {
    pub fn new(identifier: LicenseId) -> Self {
        Self {
            identifier,
            text_file: None,
            owned_files: None,
            source_files_str: "*".to_string(),
            identifier_from_scanned_text: None,
            remainder_owner: false,
        }
    }

    /// Whether `rel` is among the files this declaration covers
    pub fn owns(&self, rel: &str) -> bool {
        self.owned_files
            .as_ref()
            .map(|files| files.contains(rel))
            .unwrap_or(false)
    }

    pub fn owned_file_count(&self) -> usize {
        self.owned_files.as_ref().map(BTreeSet::len).unwrap_or(0)
    }

    /// Recovered identifier, if non-empty
    pub fn scanned_identifier(&self) -> Option<&str> {
        self.identifier_from_scanned_text
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// Declarations of one package: unique identifiers, manifest order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declarations(Vec<LicenseDeclaration>);

impl Declarations {
    /// Collapse repeated identifiers: the first keeps its position, the last
    /// one's contents win.
    pub fn from_ordered(items: Vec<LicenseDeclaration>) -> Self {
        let mut out: Vec<LicenseDeclaration> = Vec::with_capacity(items.len());
        for item in items {
            match out.iter_mut().find(|d| d.identifier == item.identifier) {
                Some(existing) => *existing = item,
                None => out.push(item),
            }
        }
        Self(out)
    }

    pub fn get(&self, identifier: &str) -> Option<&LicenseDeclaration> {
        self.0.iter().find(|d| d.identifier == identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LicenseDeclaration> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, LicenseDeclaration> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.0.iter().map(|d| d.identifier.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a LicenseDeclaration;
    type IntoIter = std::slice::Iter<'a, LicenseDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
