//! Enclosing git repository
//!
//! Several ROS packages often share one repository and one top-level
//! `LICENSE`. The repository root's license texts are scanned once and made
//! available to every package inside it.

use crate::scan::{ScanOracle, ScanResult};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Ancestors searched for a `.git` directory above the package itself
pub const REPO_SEARCH_DEPTH: usize = 5;

/// A git working tree containing one or more packages
#[derive(Debug)]
pub struct Repo {
    root: PathBuf,
    git_hash: Option<String>,
    remote_url: Option<String>,
    license_texts: OnceCell<BTreeMap<String, ScanResult>>,
}

impl Repo {
    /// Find the repository a package lives in
    pub fn discover(package_root: &Path) -> Option<Self> {
        let mut search = Some(package_root);
        for _ in 0..=REPO_SEARCH_DEPTH {
            let dir = search?;
            if dir.join(".git").exists() {
                return Some(Self::open(dir));
            }
            search = dir.parent();
        }
        tracing::debug!("No git repository found for {}", package_root.display());
        None
    }

    /// Repository at a known root; git metadata is best effort
    pub fn open(root: &Path) -> Self {
        let git_hash = git(root, &["rev-parse", "HEAD"]);
        let remote_url = git(root, &["remote"])
            .and_then(|remotes| remotes.lines().next().map(str::to_string))
            .and_then(|name| git(root, &["remote", "get-url", &name]));
        tracing::debug!(
            "Repository {} at {}",
            root.display(),
            git_hash.as_deref().unwrap_or("<unknown>")
        );
        Self {
            root: root.to_path_buf(),
            git_hash,
            remote_url,
            license_texts: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_hash(&self) -> Option<&str> {
        self.git_hash.as_deref()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// License text files among the repository root's top-level files,
    /// keyed by file name. Scanned on first use only.
    pub fn license_text_files(&self, oracle: &dyn ScanOracle) -> &BTreeMap<String, ScanResult> {
        self.license_texts.get_or_init(|| {
            let mut texts = BTreeMap::new();
            let Ok(entries) = std::fs::read_dir(&self.root) else {
                return texts;
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                match oracle.detect_license(&path) {
                    Ok(result) if result.is_license_text => {
                        texts.insert(entry.file_name().to_string_lossy().to_string(), result);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Scan of {} failed: {}", path.display(), e),
                }
            }
            tracing::info!(
                "Found {} license texts at repository root {}",
                texts.len(),
                self.root.display()
            );
            texts
        })
    }

    /// Repository-level license texts as seen from a package below the root.
    ///
    /// Keys are package-relative (`../../LICENSE`). A package at the
    /// repository root scans those files itself and gets nothing here.
    pub fn license_texts_for_package(
        &self,
        package_root: &Path,
        oracle: &dyn ScanOracle,
    ) -> Vec<(String, ScanResult)> {
        let depth = match package_root.strip_prefix(&self.root) {
            Ok(rel) => rel.components().count(),
            Err(_) => return Vec::new(),
        };
        if depth == 0 {
            return Vec::new();
        }
        let prefix = "../".repeat(depth);
        self.license_text_files(oracle)
            .iter()
            .map(|(name, result)| (format!("{}{}", prefix, name), result.clone()))
            .collect()
    }
}

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").arg("-C").arg(root).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
