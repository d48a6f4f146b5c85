use super::{Finding, Verdict};
use crate::manifest::MANIFEST_FILE_NAME;
use crate::package::{PackageError, PackageModel};

pub(super) fn evaluate(model: &PackageModel) -> Result<Verdict, PackageError> {
    let decls = model.declarations()?;
    if decls.is_empty() {
        return Ok(Verdict::failure("No license tag defined.")
            .with_findings(vec![Finding::new(MANIFEST_FILE_NAME, "declares no <license> tag")])
            .with_verbose("Declared licenses: []"));
    }
    Ok(Verdict::success(format!(
        "Found licenses {}",
        decls.identifiers().join(", ")
    )))
}
