//! Report rendering: plain text for terminals and CI logs, JSON for tooling
//!
//! The text layout prints every check as its name followed by an indented
//! `STATUS reason` line. A package block ends with an overall line, and the
//! run ends with one for all packages.

pub mod json;

use crate::checks::Status;
use crate::engine::{PackageReport, RunReport};
use crate::AuditResult;

const MAJOR_SEP: &str = "====================";
const MINOR_SEP: &str = "--------------------";

/// How much of the text report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Package summary and overall result only
    Quiet,
    #[default]
    Normal,
    /// Adds the package list and diagnostic scan results
    Verbose,
}

/// Output format of the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text(Verbosity),
    Json,
}

/// Render a report in the requested format
pub fn render_report(report: &RunReport, format: ReportFormat) -> AuditResult<String> {
    match format {
        ReportFormat::Text(verbosity) => Ok(render_text(report, verbosity)),
        ReportFormat::Json => json::render(report),
    }
}

/// Render a run as text
pub fn render_text(report: &RunReport, verbosity: Verbosity) -> String {
    let mut out = TextOut::new(verbosity);

    if report.is_empty() {
        out.line(Verbosity::Quiet, format!("No packages found in {}", report.target.display()));
        return out.finish();
    }

    out.line(
        Verbosity::Quiet,
        format!("Found {} packages in {}", report.packages.len(), report.target.display()),
    );
    let names: Vec<&str> = report.packages.iter().map(|p| p.name.as_str()).collect();
    out.line(Verbosity::Verbose, format!(" Packages: {}", names.join(", ")));
    out.line(Verbosity::Normal, MAJOR_SEP);

    for package in &report.packages {
        render_package(&mut out, package);
    }

    out.line(
        Verbosity::Quiet,
        format!("Execution time: {:.2} seconds", report.duration_ms as f64 / 1000.0),
    );
    out.line(Verbosity::Quiet, format!("All packages:\n {}", report.overall));
    out.finish()
}

fn render_package(out: &mut TextOut, package: &PackageReport) {
    out.line(Verbosity::Normal, format!("[{}]", package.name));
    if let Some(hash) = &package.git_hash {
        out.line(
            Verbosity::Normal,
            format!("git hash of ({}): {}", package.path.display(), hash),
        );
    }

    for outcome in &package.outcomes {
        out.line(
            Verbosity::Normal,
            format!("{}\n {} {}", outcome.check.name(), outcome.status, outcome.reason),
        );
        if let Some(verbose) = &outcome.verbose {
            out.line(Verbosity::Verbose, verbose);
        }
    }

    out.line(Verbosity::Normal, MINOR_SEP);
    let overall = format!("[{}] Overall:\n {}", package.name, package.status);
    // Quiet runs still name the packages that did not pass
    let level = if package.status == Status::Success {
        Verbosity::Normal
    } else {
        Verbosity::Quiet
    };
    out.line(level, overall);
    out.line(Verbosity::Normal, MAJOR_SEP);
}

/// Line buffer that drops lines above the configured verbosity
struct TextOut {
    verbosity: Verbosity,
    buf: String,
}

impl TextOut {
    fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            buf: String::with_capacity(4096),
        }
    }

    fn line(&mut self, level: Verbosity, text: impl AsRef<str>) {
        if level <= self.verbosity {
            self.buf.push_str(text.as_ref());
            self.buf.push('\n');
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}
