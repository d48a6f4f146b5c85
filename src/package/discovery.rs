//! Package discovery
//!
//! A package is any directory holding a `package.xml`. The walk does not
//! descend into packages, hidden directories, or directories marked with one
//! of the build tools' ignore markers.

use crate::manifest::MANIFEST_FILE_NAME;
use crate::{AuditError, AuditResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker files that hide a directory from the build tools
pub const IGNORE_MARKERS: [&str; 3] = ["COLCON_IGNORE", "CATKIN_IGNORE", "AMENT_IGNORE"];

/// Absolute package directories under `path`, sorted
pub fn find_packages(path: &Path) -> AuditResult<Vec<PathBuf>> {
    if !path.is_dir() {
        return Err(AuditError::Discovery(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    let root = path.canonicalize()?;

    let mut packages = Vec::new();
    let mut walker = WalkDir::new(&root).follow_links(false).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if entry.depth() > 0 && crate::scan::is_hidden(entry.file_name()) {
            walker.skip_current_dir();
            continue;
        }
        if IGNORE_MARKERS.iter().any(|m| dir.join(m).exists()) {
            tracing::debug!("Ignoring marked directory {}", dir.display());
            walker.skip_current_dir();
            continue;
        }
        if dir.join(MANIFEST_FILE_NAME).is_file() {
            tracing::debug!("Found package at {}", dir.display());
            packages.push(dir.to_path_buf());
            walker.skip_current_dir();
        }
    }

    packages.sort();
    tracing::info!("Discovered {} packages under {}", packages.len(), root.display());
    Ok(packages)
}
