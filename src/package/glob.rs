//! Source-file glob resolution
//!
//! `source-files` attributes hold space-separated glob patterns relative to
//! the package root. They resolve to regular files only; `**` recurses.

use super::PackageError;
use glob::MatchOptions;
use std::collections::BTreeSet;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Whether a `source-files` value leaves the declaration as remainder owner
pub fn is_remainder_pattern(source_files: Option<&str>) -> bool {
    match source_files.map(str::trim) {
        None => true,
        Some(s) => s.is_empty() || s == "*" || s == "**",
    }
}

/// Resolve space-separated patterns to package-relative file paths
pub fn resolve_globs(patterns: &str, package_root: &Path) -> Result<BTreeSet<String>, PackageError> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: true,
    };

    // The root itself may contain glob metacharacters
    let escaped_root = glob::Pattern::escape(&package_root.to_string_lossy());

    let mut files = BTreeSet::new();
    for pattern in patterns.split_whitespace() {
        if escapes_root(pattern) {
            return Err(PackageError::InvalidGlob(format!(
                "{}: escapes the package root",
                pattern
            )));
        }
        let query = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
        let paths = glob::glob_with(&query, options)
            .map_err(|e| PackageError::InvalidGlob(format!("{}: {}", pattern, e)))?;
        for path in paths.filter_map(|p| p.ok()) {
            if !path.is_file() {
                continue;
            }
            if let Some(rel) = relative_path(package_root, &path) {
                files.insert(rel);
            }
        }
    }
    Ok(files)
}

/// Absolute patterns and `..` components reach outside the package
fn escapes_root(pattern: &str) -> bool {
    pattern.starts_with('/') || pattern.split('/').any(|c| c == "..")
}

/// Every non-hidden regular file under the package root
pub fn all_files(package_root: &Path) -> BTreeSet<String> {
    WalkDir::new(package_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !crate::scan::is_hidden(e.file_name()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| relative_path(package_root, e.path()))
        .collect()
}

/// `path` relative to `root`, `/`-separated. Purely lexical.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        for f in [
            "package.xml",
            "LICENSE",
            "src/a.cpp",
            "src/b.cpp",
            "src/impl/c.cpp",
            "third_party/x.c",
            ".hidden/secret.c",
            "src/.dotfile",
        ] {
            let p = root.join(f);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, "x").unwrap();
        }
        dir
    }

    #[test]
    fn test_remainder_patterns() {
        assert!(is_remainder_pattern(None));
        assert!(is_remainder_pattern(Some("")));
        assert!(is_remainder_pattern(Some(" * ")));
        assert!(is_remainder_pattern(Some("**")));
        assert!(!is_remainder_pattern(Some("src/*")));
    }

    #[test]
    fn test_resolve_files_only() {
        let dir = tree();
        let files = resolve_globs("src/*", dir.path()).unwrap();
        // src/impl is a directory and is excluded; *.cpp does not match the dotfile
        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["src/a.cpp", "src/b.cpp"]
        );
    }

    #[test]
    fn test_resolve_recursive_and_multiple() {
        let dir = tree();
        let files = resolve_globs("src/**/*.cpp  third_party/*", dir.path()).unwrap();
        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["src/a.cpp", "src/b.cpp", "src/impl/c.cpp", "third_party/x.c"]
        );
    }

    #[test]
    fn test_invalid_glob() {
        let dir = tree();
        assert!(matches!(
            resolve_globs("src/[", dir.path()),
            Err(PackageError::InvalidGlob(_))
        ));
    }

    #[test]
    fn test_patterns_outside_the_package_are_rejected() {
        let dir = tree();
        let pkg = dir.path().join("src");
        for pattern in ["../third_party/*", "impl/../../LICENSE", "/etc/*"] {
            let err = resolve_globs(pattern, &pkg).unwrap_err();
            assert_eq!(
                err,
                PackageError::InvalidGlob(format!("{}: escapes the package root", pattern))
            );
        }
        // One bad pattern spoils the whole attribute
        assert!(resolve_globs("*.cpp ../LICENSE", &pkg).is_err());
        assert!(resolve_globs("*.cpp", &pkg).is_ok());
    }

    #[test]
    fn test_all_files_skips_hidden() {
        let dir = tree();
        let files = all_files(dir.path());
        assert!(files.contains("src/impl/c.cpp"));
        assert!(files.contains("package.xml"));
        assert!(!files.iter().any(|f| f.contains(".hidden") || f.contains(".dotfile")));
        assert_eq!(files.len(), 6);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b/c/d.txt")).as_deref(),
            Some("c/d.txt")
        );
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/x")), None);
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), None);
    }
}
