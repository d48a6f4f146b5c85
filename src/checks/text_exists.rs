//! Every declaration must link a license text whose content matches it.
//!
//! Per declaration, the first failing condition wins: no link, missing
//! file, file not classified as license text, no identifier recovered from
//! the content, recovered identifier differing from the declared one. A
//! mismatch is only a warning when the declared identifier is not a
//! recognized one; such a tag is presumed to be a custom name for the
//! license its text proves. When the content check fails, the text may still
//! pass by being close enough to the canonical text of the declared license.

use super::{render_findings, CheckContext, Finding, Status, Verdict};
use crate::license::text_similarity;
use crate::package::{LicenseDeclaration, PackageError, PackageModel};

pub(super) fn evaluate(model: &PackageModel, ctx: &CheckContext) -> Result<Verdict, PackageError> {
    let decls = model.declarations()?;
    if decls.is_empty() {
        return Ok(Verdict::failure("No license tag defined."));
    }

    let mut findings = Vec::new();
    let mut statuses = Vec::new();
    for decl in decls {
        if let Some((status, reason)) = check_declaration(model, ctx, decl) {
            findings.push(Finding::new(decl.identifier.as_str(), reason));
            statuses.push(status);
        }
    }

    if findings.is_empty() {
        return Ok(Verdict::success("All license tags have a valid license text file."));
    }

    let scanned = model
        .license_text_files()
        .iter()
        .map(|(path, result)| format!("  '{}': {}", path, result.detected_license_expression))
        .collect::<Vec<_>>()
        .join("\n");

    let verdict = if Status::worst(statuses) == Status::Warning {
        Verdict::warning(format!(
            "Since they are not in the SPDX list, we can not check if these tags have the correct license text:\n{}",
            render_findings(&findings)
        ))
    } else {
        Verdict::failure(format!(
            "The following license tags do not have a valid license text file:\n{}",
            render_findings(&findings)
        ))
    };
    Ok(verdict.with_findings(findings).with_verbose(scanned))
}

fn check_declaration(
    model: &PackageModel,
    ctx: &CheckContext,
    decl: &LicenseDeclaration,
) -> Option<(Status, String)> {
    let Some(text_file) = decl.text_file.as_deref() else {
        return Some((Status::Failure, "No license text file defined.".to_string()));
    };
    if !model.root_path().join(text_file).exists() {
        return Some((
            Status::Failure,
            format!("License text file '{}' does not exist.", text_file),
        ));
    }
    let Some(scanned) = model.license_text_files().get(text_file) else {
        return Some((
            Status::Failure,
            format!("License text file '{}' not included in scan results.", text_file),
        ));
    };

    let Some(actual) = scanned.spdx_from_license_text() else {
        if matches_reference_text(model, ctx, decl, text_file) {
            return None;
        }
        return Some((
            Status::Failure,
            format!("License text file '{}' is not recognized as license text.", text_file),
        ));
    };

    if decl.identifier == actual {
        return None;
    }
    if matches_reference_text(model, ctx, decl, text_file) {
        return None;
    }

    let reason = format!(
        "License text file '{}' is of license {} but tag is {}.",
        text_file, actual, decl.identifier
    );
    if model.vocabulary().is_recognized(decl.identifier.as_str()) {
        Some((Status::Failure, reason))
    } else {
        Some((Status::Warning, reason))
    }
}

fn matches_reference_text(
    model: &PackageModel,
    ctx: &CheckContext,
    decl: &LicenseDeclaration,
    text_file: &str,
) -> bool {
    let Some(reference) = ctx.reference_texts.reference_text(&decl.identifier) else {
        return false;
    };
    let path = model.root_path().join(text_file);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            return false;
        }
    };
    let similarity = text_similarity(&content, &reference);
    tracing::debug!(
        "{} vs reference {}: similarity {:.3}",
        text_file,
        decl.identifier,
        similarity
    );
    similarity >= ctx.similarity_threshold
}
