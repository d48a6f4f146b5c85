use super::{Finding, Verdict};
use crate::package::{PackageError, PackageModel};

pub(super) fn evaluate(model: &PackageModel) -> Result<Verdict, PackageError> {
    let decls = model.declarations()?;
    if decls.is_empty() {
        return Ok(Verdict::success("No license tags to check."));
    }

    let unrecognized: Vec<&str> = decls
        .iter()
        .map(|d| d.identifier.as_str())
        .filter(|id| !model.vocabulary().is_recognized(id))
        .collect();

    if unrecognized.is_empty() {
        return Ok(Verdict::success("All license tags are in SPDX list of licenses."));
    }

    let findings = unrecognized
        .iter()
        .map(|id| Finding::new(*id, "not in SPDX list of licenses"))
        .collect();
    Ok(Verdict::warning(format!(
        "Licenses {} are not in SPDX list of licenses. \
         Make sure to exactly match one of https://spdx.org/licenses/.",
        unrecognized.join(", ")
    ))
    .with_findings(findings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::model;
    use crate::checks::Status;
    use crate::manifest::ManifestLicenseEntry;

    #[test]
    fn test_recognized_tags() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(
            dir.path(),
            vec![ManifestLicenseEntry::new("Apache License 2.0", Some("LICENSE"), None)],
            &[],
            &[],
        );
        assert_eq!(evaluate(&m).unwrap().status, Status::Success);
    }

    #[test]
    fn test_unrecognized_tag_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let m = model(
            dir.path(),
            vec![
                ManifestLicenseEntry::new("BSD", Some("LICENSE"), None),
                ManifestLicenseEntry::new("mit", Some("LICENSE.mit"), Some("x/*")),
                ManifestLicenseEntry::new("Zlib", Some("LICENSE.z"), Some("z/*")),
            ],
            &[],
            &[],
        );
        let verdict = evaluate(&m).unwrap();
        assert_eq!(verdict.status, Status::Warning);
        let entities: Vec<_> = verdict.findings.iter().map(|f| f.entity.as_str()).collect();
        assert_eq!(entities, vec!["BSD", "mit"]);
    }

    #[test]
    fn test_no_tags_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            evaluate(&model(dir.path(), vec![], &[], &[])).unwrap().status,
            Status::Success
        );
    }
}
