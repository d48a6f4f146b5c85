//! JSON report renderer

use crate::engine::RunReport;
use crate::AuditResult;

/// Render a run report as pretty-printed JSON
pub fn render(report: &RunReport) -> AuditResult<String> {
    serde_json::to_string_pretty(report).map_err(crate::AuditError::SerdeError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Check, CheckOutcome, Finding, Status};
    use crate::engine::PackageReport;
    use std::path::PathBuf;

    #[test]
    fn test_render_json() {
        let report = RunReport {
            target: PathBuf::from("/ws"),
            packages: vec![PackageReport {
                name: "pkg".to_string(),
                path: PathBuf::from("/ws/pkg"),
                git_hash: Some("abc123".to_string()),
                outcomes: vec![CheckOutcome {
                    check: Check::TagIsRecognized,
                    status: Status::Warning,
                    reason: "Licenses BSD are not in SPDX list of licenses.".to_string(),
                    findings: vec![Finding::new("BSD", "not in SPDX list of licenses")],
                    verbose: None,
                    duration_ms: 1,
                }],
                status: Status::Warning,
                duration_ms: 2,
            }],
            statuses: [("/ws/pkg".to_string(), Status::Warning)].into_iter().collect(),
            overall: Status::Warning,
            duration_ms: 3,
        };

        let json = render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overall"], "WARNING");
        assert_eq!(value["packages"][0]["outcomes"][0]["status"], "WARNING");
        assert_eq!(value["packages"][0]["outcomes"][0]["findings"][0]["entity"], "BSD");
        assert!(value["packages"][0]["outcomes"][0].get("verbose").is_none());

        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.packages[0].git_hash.as_deref(), Some("abc123"));
    }
}
