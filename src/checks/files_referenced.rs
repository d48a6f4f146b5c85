//! Every license text inside the package must be claimed by a declaration.
//! Repository-level texts above the package are not this package's concern.

use super::{unofficial_tags, Finding, Verdict};
use crate::package::{is_repo_level, PackageError, PackageModel};

const HEADER: &str = "The following license files are not mentioned by any tag:";

pub(super) fn evaluate(model: &PackageModel) -> Result<Verdict, PackageError> {
    let decls = model.declarations()?;
    let unofficial = unofficial_tags(model, decls);

    let mut not_covered = Vec::new();
    let mut unofficially_covered = Vec::new();
    for (file, result) in model.license_text_files() {
        if is_repo_level(file) {
            continue;
        }
        let spdx = result.detected_license_expression.as_str();
        if !spdx.is_empty() && decls.contains(spdx) {
            continue;
        }
        match unofficial.get(spdx) {
            Some(tag) => unofficially_covered.push(Finding::new(
                file.as_str(),
                format!("is of {} but its tag is {}.", spdx, tag),
            )),
            None => not_covered.push(Finding::new(file.as_str(), format!("is of {}.", spdx))),
        }
    }

    if !not_covered.is_empty() {
        return Ok(Verdict::failure(format!("{}\n{}", HEADER, lines(&not_covered))).with_findings(not_covered));
    }
    if !unofficially_covered.is_empty() {
        return Ok(
            Verdict::warning(format!("{}\n{}", HEADER, lines(&unofficially_covered)))
                .with_findings(unofficially_covered),
        );
    }
    Ok(Verdict::success("All license texts are referenced by a tag."))
}

fn lines(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("  '{}' {}", f.entity, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::model;
    use crate::checks::Status;
    use crate::manifest::ManifestLicenseEntry;

    #[test]
    fn test_all_referenced() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(
            dir.path(),
            vec![ManifestLicenseEntry::new("MIT", Some("LICENSE"), None)],
            &[("LICENSE", "MIT"), ("../../LICENSE", "Apache-2.0")],
            &[],
        );
        assert_eq!(evaluate(&m).unwrap().status, Status::Success);
    }

    #[test]
    fn test_unreferenced_text_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(
            dir.path(),
            vec![ManifestLicenseEntry::new("MIT", Some("LICENSE"), None)],
            &[("LICENSE", "MIT"), ("third_party/COPYING", "GPL-2.0-only")],
            &[],
        );
        let verdict = evaluate(&m).unwrap();
        assert_eq!(verdict.status, Status::Failure);
        assert_eq!(
            verdict.findings,
            vec![Finding::new("third_party/COPYING", "is of GPL-2.0-only.")]
        );
    }

    #[test]
    fn test_unofficially_referenced_text_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(
            dir.path(),
            vec![ManifestLicenseEntry::new("BSD", Some("LICENSE"), None)],
            &[("LICENSE", "BSD-3-Clause")],
            &[],
        );
        let verdict = evaluate(&m).unwrap();
        assert_eq!(verdict.status, Status::Warning);
        assert!(verdict.reason.contains("'LICENSE' is of BSD-3-Clause but its tag is BSD."));
    }

    #[test]
    fn test_zero_declarations_still_checks_texts() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(dir.path(), vec![], &[("LICENSE", "MIT")], &[]);
        assert_eq!(evaluate(&m).unwrap().status, Status::Failure);
        let empty = model(dir.path(), vec![], &[], &[]);
        assert_eq!(evaluate(&empty).unwrap().status, Status::Success);
    }

    #[test]
    fn test_repo_level_paths() {
        assert!(!is_repo_level("LICENSE"));
        assert!(!is_repo_level("a/b/LICENSE"));
        assert!(is_repo_level("../LICENSE"));
        assert!(is_repo_level("../../COPYING"));
    }
}
