//! Shared fixtures for the integration tests

#![allow(dead_code)]

use ros_license_audit::scan::FixtureOracle;
use ros_license_audit::{AuditConfig, Auditor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// `<license>` tag as it appears in package.xml
pub fn license_tag(id: &str, file: Option<&str>, source_files: Option<&str>) -> String {
    let mut attrs = String::new();
    if let Some(file) = file {
        attrs.push_str(&format!(" file=\"{}\"", file));
    }
    if let Some(source_files) = source_files {
        attrs.push_str(&format!(" source-files=\"{}\"", source_files));
    }
    format!("<license{}>{}</license>", attrs, id)
}

/// Write a package.xml with the given license tags under `root/dir`
pub fn write_package(root: &Path, dir: &str, name: &str, tags: &[String]) -> PathBuf {
    let manifest = format!(
        "<?xml version=\"1.0\"?>\n<package format=\"3\">\n  <name>{}</name>\n  <version>0.1.0</version>\n  {}\n</package>\n",
        name,
        tags.join("\n  ")
    );
    let rel = if dir.is_empty() {
        "package.xml".to_string()
    } else {
        format!("{}/package.xml", dir)
    };
    write(root, &rel, &manifest);
    root.join(dir)
}

/// Workspace in a temp dir; fixture keys are relative to its canonical root
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { dir, root }
    }

    pub fn oracle(&self) -> FixtureOracle {
        FixtureOracle::new(self.root.clone())
    }

    pub fn auditor(&self, oracle: FixtureOracle) -> Auditor {
        Auditor::with_oracle(AuditConfig::default(), Arc::new(oracle))
    }
}
