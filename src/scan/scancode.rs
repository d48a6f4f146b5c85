//! ScanCode Toolkit oracle
//!
//! Shells out to the `scancode` CLI once per file and parses its JSON report.
//! License and copyright detection come from the same run, so the parsed
//! report is kept per path and the second question is answered from memory.

use super::{ScanOracle, ScanResult};
use crate::{AuditError, AuditResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Parsed per-file section of a ScanCode report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanCodeFile {
    pub percentage_of_license_text: f64,
    pub detected_license_expression_spdx: String,
    /// (score, matched rule is a license text) per detection match
    pub matches: Vec<(f64, bool)>,
    pub copyrights: Vec<String>,
}

impl ScanCodeFile {
    fn to_scan_result(&self, threshold: f64) -> ScanResult {
        let rule_is_text = self
            .matches
            .iter()
            .any(|(score, is_text)| *is_text && *score >= threshold);
        ScanResult {
            license_text_confidence: self.percentage_of_license_text,
            is_license_text: self.percentage_of_license_text >= threshold || rule_is_text,
            detected_license_expression: self.detected_license_expression_spdx.clone(),
        }
    }
}

/// Oracle backed by the `scancode` command line tool
pub struct ScanCodeOracle {
    binary: String,
    timeout_secs: u64,
    license_text_threshold: f64,
    reports: Mutex<HashMap<PathBuf, ScanCodeFile>>,
}

impl ScanCodeOracle {
    pub fn new(binary: impl Into<String>, timeout_secs: u64, license_text_threshold: f64) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs,
            license_text_threshold,
            reports: Mutex::new(HashMap::new()),
        }
    }

    /// Check if the configured binary runs
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn report(&self, path: &Path) -> AuditResult<ScanCodeFile> {
        if let Ok(reports) = self.reports.lock() {
            if let Some(cached) = reports.get(path) {
                return Ok(cached.clone());
            }
        }

        let file = self.run(path)?;
        if let Ok(mut reports) = self.reports.lock() {
            reports.insert(path.to_path_buf(), file.clone());
        }
        Ok(file)
    }

    fn run(&self, path: &Path) -> AuditResult<ScanCodeFile> {
        let output_file = tempfile::NamedTempFile::new()?;

        let output = Command::new(&self.binary)
            .args(["--license", "--copyright", "--quiet", "--timeout"])
            .arg(self.timeout_secs.to_string())
            .arg("--json-pp")
            .arg(output_file.path())
            .arg(path)
            .output()
            .map_err(|e| AuditError::Scanner(format!("Failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuditError::Scanner(format!(
                "{} failed on {}: {}",
                self.binary,
                path.display(),
                stderr.trim()
            )));
        }

        let json = std::fs::read_to_string(output_file.path())?;
        parse_report(&json)?.into_iter().next().ok_or_else(|| {
            AuditError::Scanner(format!("No file entry in report for {}", path.display()))
        })
    }
}

impl ScanOracle for ScanCodeOracle {
    fn detect_license(&self, path: &Path) -> AuditResult<ScanResult> {
        Ok(self.report(path)?.to_scan_result(self.license_text_threshold))
    }

    fn detect_copyrights(&self, path: &Path) -> AuditResult<Vec<String>> {
        Ok(self.report(path)?.copyrights)
    }
}

/// Parse the `files` entries of a ScanCode JSON report
pub fn parse_report(json: &str) -> AuditResult<Vec<ScanCodeFile>> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;

    let mut files = Vec::new();
    let Some(entries) = parsed.get("files").and_then(|f| f.as_array()) else {
        return Ok(files);
    };

    for entry in entries {
        if entry.get("type").and_then(|t| t.as_str()) == Some("directory") {
            continue;
        }

        let mut matches = Vec::new();
        for detection in entry
            .get("license_detections")
            .and_then(|d| d.as_array())
            .into_iter()
            .flatten()
        {
            for m in detection
                .get("matches")
                .and_then(|m| m.as_array())
                .into_iter()
                .flatten()
            {
                let score = m.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
                let is_text = m
                    .get("matched_rule")
                    .and_then(|r| r.get("is_license_text"))
                    .and_then(|b| b.as_bool())
                    .unwrap_or(false);
                matches.push((score, is_text));
            }
        }

        let copyrights = entry
            .get("copyrights")
            .and_then(|c| c.as_array())
            .into_iter()
            .flatten()
            .filter_map(|c| c.get("copyright").and_then(|s| s.as_str()))
            .map(|s| s.to_string())
            .collect();

        files.push(ScanCodeFile {
            percentage_of_license_text: entry
                .get("percentage_of_license_text")
                .and_then(|p| p.as_f64())
                .unwrap_or(0.0),
            detected_license_expression_spdx: entry
                .get("detected_license_expression_spdx")
                .and_then(|s| s.as_str())
                .unwrap_or("")
                .to_string(),
            matches,
            copyrights,
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
  "headers": [],
  "files": [
    {
      "path": "LICENSE",
      "type": "file",
      "detected_license_expression_spdx": "Apache-2.0",
      "percentage_of_license_text": 100.0,
      "license_detections": [
        {"matches": [{"score": 100.0, "matched_rule": {"is_license_text": true}}]}
      ],
      "copyrights": []
    }
  ]
}"#;

    #[test]
    fn test_parse_license_text_report() {
        let files = parse_report(REPORT).unwrap();
        assert_eq!(files.len(), 1);
        let result = files[0].to_scan_result(99.0);
        assert!(result.is_license_text);
        assert_eq!(result.detected_license_expression, "Apache-2.0");
        assert_eq!(result.spdx_from_license_text(), Some("Apache-2.0"));
    }

    #[test]
    fn test_parse_code_report_with_copyrights() {
        let json = r#"{"files": [
            {"path": "src", "type": "directory"},
            {"path": "src/a.cpp", "type": "file",
             "detected_license_expression_spdx": "BSD-3-Clause",
             "percentage_of_license_text": 12.5,
             "license_detections": [{"matches": [{"score": 95.0, "matched_rule": {"is_license_text": false}}]}],
             "copyrights": [{"copyright": "Copyright (c) 2021 Open Robotics", "start_line": 1}]}
        ]}"#;
        let files = parse_report(json).unwrap();
        assert_eq!(files.len(), 1);
        let result = files[0].to_scan_result(99.0);
        assert!(!result.is_license_text);
        assert_eq!(result.detected_license_expression, "BSD-3-Clause");
        assert_eq!(files[0].copyrights, vec!["Copyright (c) 2021 Open Robotics"]);
    }

    #[test]
    fn test_license_text_by_rule() {
        let file = ScanCodeFile {
            percentage_of_license_text: 80.0,
            detected_license_expression_spdx: "MIT".into(),
            matches: vec![(99.5, true)],
            copyrights: vec![],
        };
        assert!(file.to_scan_result(99.0).is_license_text);
        assert!(!file.to_scan_result(99.9).is_license_text);
    }

    #[test]
    fn test_malformed_report() {
        assert!(parse_report("not json").is_err());
        assert!(parse_report("{}").unwrap().is_empty());
    }

    #[test]
    fn test_missing_binary_is_scanner_error() {
        let oracle = ScanCodeOracle::new("definitely-not-a-scancode-binary", 5, 99.0);
        assert!(!oracle.is_available());
        let err = oracle.detect_license(Path::new("/tmp/whatever")).unwrap_err();
        assert!(matches!(err, AuditError::Scanner(_)));
    }
}
