//! Every license detected in the code must be declared, and declared for
//! that file.

use super::{render_findings, unofficial_tags, Finding, Verdict};
use crate::license::conjuncts;
use crate::package::{PackageError, PackageModel};
use std::collections::{BTreeMap, BTreeSet};

pub(super) fn evaluate(model: &PackageModel) -> Result<Verdict, PackageError> {
    let decls = model.declarations()?;
    if decls.is_empty() {
        return Ok(Verdict::failure("No license tag defined."));
    }

    let text_files: BTreeSet<&str> = decls.iter().filter_map(|d| d.text_file.as_deref()).collect();
    let unofficial = unofficial_tags(model, decls);

    let mut uncovered: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut unofficial_hits: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    let mut not_attributed: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for (file, result) in model.files_with_detected_licenses() {
        if text_files.contains(file.as_str()) {
            continue;
        }
        for license in conjuncts(&result.detected_license_expression) {
            match decls.get(&license) {
                Some(decl) => {
                    if !decl.owns(file) {
                        not_attributed.entry(file.as_str()).or_default().push(license);
                    }
                }
                None => match unofficial.get(&license) {
                    Some(tag) => unofficial_hits
                        .entry(file.as_str())
                        .or_default()
                        .push((license, tag.clone())),
                    None => uncovered.entry(file.as_str()).or_default().push(license),
                },
            }
        }
    }

    if !uncovered.is_empty() {
        let findings = list_findings(&uncovered);
        return Ok(Verdict::failure(format!(
            "The following files contain licenses that are not covered by any license tag:\n{}",
            render_findings(&findings)
        ))
        .with_verbose(relevant_results(model, uncovered.keys().chain(not_attributed.keys())))
        .with_findings(findings));
    }

    if !unofficial_hits.is_empty() {
        let findings: Vec<Finding> = unofficial_hits
            .iter()
            .flat_map(|(file, hits)| {
                hits.iter().map(move |(spdx, tag)| {
                    Finding::new(*file, format!("is of {} but its Tag is {}.", spdx, tag))
                })
            })
            .collect();
        let lines = findings
            .iter()
            .map(|f| format!("  '{}' {}", f.entity, f.reason))
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(Verdict::warning(format!(
            "For the following files, please change the License Tag in the package file to SPDX format:\n{}",
            lines
        ))
        .with_findings(findings));
    }

    if !not_attributed.is_empty() {
        let findings = list_findings(&not_attributed);
        return Ok(Verdict::failure(format!(
            "The following files contain licenses that are covered by a license tag but are not \
             listed in the source files of the license tag:\n{}",
            render_findings(&findings)
        ))
        .with_verbose(relevant_results(model, not_attributed.keys()))
        .with_findings(findings));
    }

    Ok(Verdict::success(
        "All licenses found in the code are covered by a license declaration.",
    ))
}

fn list_findings(by_file: &BTreeMap<&str, Vec<String>>) -> Vec<Finding> {
    by_file
        .iter()
        .map(|(file, licenses)| Finding::new(*file, licenses.join(", ")))
        .collect()
}

fn relevant_results<I, S>(model: &PackageModel, files: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = vec!["Relevant scan results:".to_string()];
    let found = model.files_with_detected_licenses();
    for file in files {
        let file = file.as_ref();
        if let Some(result) = found.get(file) {
            lines.push(format!("  '{}': {}", file, result.detected_license_expression));
        }
    }
    lines.join("\n")
}
