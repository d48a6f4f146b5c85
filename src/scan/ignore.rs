//! Paths excluded from scanning
//!
//! Build descriptors and the manifest itself routinely carry license words
//! without being covered by a license, so they never reach the oracle.
//! Packages add their own patterns in a `.scanignore` file.

use crate::config::CONFIG_FILE_NAMES;
use crate::manifest::MANIFEST_FILE_NAME;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Per-package ignore file, one fnmatch pattern per line
pub const SCANIGNORE_FILE_NAME: &str = ".scanignore";

const DEFAULT_IGNORED: &[&str] = &[
    MANIFEST_FILE_NAME,
    "setup.py",
    "setup.cfg",
    "CMakeLists.txt",
    ".git/*",
];

/// Compiled ignore patterns, matched against package-relative paths
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<Pattern>,
}

impl IgnoreList {
    /// Built-in patterns only
    pub fn defaults() -> Self {
        let mut list = Self::default();
        list.extend(DEFAULT_IGNORED.iter().copied());
        list.extend(CONFIG_FILE_NAMES.iter().copied());
        list
    }

    /// Defaults plus configured patterns plus the package's `.scanignore`
    pub fn for_package(package_root: &Path, extra: &[String]) -> Self {
        let mut list = Self::defaults();
        list.extend(extra.iter().map(String::as_str));

        let scanignore = package_root.join(SCANIGNORE_FILE_NAME);
        if let Ok(content) = std::fs::read_to_string(&scanignore) {
            let lines: Vec<&str> = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .collect();
            tracing::debug!("{} patterns from {}", lines.len(), scanignore.display());
            list.extend(lines);
        }
        list
    }

    pub fn extend<'a>(&mut self, patterns: impl IntoIterator<Item = &'a str>) {
        for p in patterns {
            match Pattern::new(p) {
                Ok(pattern) => self.patterns.push(pattern),
                Err(e) => tracing::warn!("Invalid ignore pattern {:?}: {}", p, e),
            }
        }
    }

    /// fnmatch semantics: `*` also crosses `/`
    pub fn is_ignored(&self, rel: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.patterns.iter().any(|p| p.matches_with(rel, options))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
