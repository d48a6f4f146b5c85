//! # Copyright Notice Generation
//!
//! Renders a package's declarations into a Debian machine-readable copyright
//! file (format 1.0). One stanza per declaration:
//!
//! | Field       | Source                                             |
//! |-------------|----------------------------------------------------|
//! | `Files`     | the declaration's `source-files` patterns          |
//! | `Copyright` | copyright strings found in the owned files         |
//! | `License`   | declared identifier, followed by the indented text |

use crate::package::PackageModel;
use crate::{AuditError, AuditResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const FORMAT_URL: &str = "https://www.debian.org/doc/packaging-manuals/copyright-format/1.0/";

/// Longest match first so "(c)" is not left behind
const PREFIXES: &[&str] = &["copyright (c) ", "copyright (c)", "copyright ", "copyright"];

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\s*-\s*(\d{4})\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// Years named in a copyright string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyrightYears {
    Single(u32),
    Range(u32, u32),
}

/// Strip a leading "Copyright (c)" in any case
pub fn clean_copyright_text(text: &str) -> &str {
    for prefix in PREFIXES {
        if let Some(head) = text.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &text[prefix.len()..];
            }
        }
    }
    text
}

/// Extract `2023` or `2010-2023` from a copyright string
pub fn parse_copyright_years(text: &str) -> Option<CopyrightYears> {
    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        let from = caps[1].parse().ok()?;
        let to = caps[2].parse().ok()?;
        return Some(CopyrightYears::Range(from, to));
    }
    let caps = YEAR_RE.captures(text)?;
    caps[1].parse().ok().map(CopyrightYears::Single)
}

/// Declared identifier → sorted, deduplicated copyright holders of its files
pub fn copyright_strings_per_declaration(model: &PackageModel) -> AuditResult<BTreeMap<String, Vec<String>>> {
    let decls = model
        .declarations()
        .map_err(|e| AuditError::Copyright(e.to_string()))?;

    let mut per_decl = BTreeMap::new();
    for decl in decls {
        let mut holders = BTreeSet::new();
        for file in decl.owned_files.iter().flatten() {
            for found in model.copyrights(file) {
                holders.insert(clean_copyright_text(&found).to_string());
            }
        }
        per_decl.insert(decl.identifier.to_string(), holders.into_iter().collect());
    }
    Ok(per_decl)
}

/// Contents of the package's `copyright` file
pub fn render_copyright_file(model: &PackageModel) -> AuditResult<String> {
    let decls = model
        .declarations()
        .map_err(|e| AuditError::Copyright(e.to_string()))?;
    let mut holders = copyright_strings_per_declaration(model)?;

    let source = model.repo().and_then(|r| r.remote_url()).unwrap_or("");
    let mut out = format!(
        "Format: {}\nSource: {}\nUpstream-Name: {}\n\n",
        FORMAT_URL,
        source,
        model.name()
    );

    for decl in decls {
        let copyrights = holders.remove(decl.identifier.as_str()).unwrap_or_default();
        out.push_str(&format!("Files:\n {}\n", decl.source_files_str));
        out.push_str(&format!("Copyright: {}\n", copyrights.join("\n           ")));
        out.push_str(&format!("License: {}\n", decl.identifier));

        let text_file = decl.text_file.as_deref().ok_or_else(|| {
            AuditError::Copyright(format!("No license text file defined for {}.", decl.identifier))
        })?;
        let path = model.root_path().join(text_file);
        if !path.is_file() {
            return Err(AuditError::Copyright(format!(
                "File {} does not exist.",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(&path)?;
        for line in text.split_inclusive('\n') {
            if line == "\n" {
                out.push('\n');
            } else {
                out.push(' ');
                out.push_str(line);
            }
        }
        out.push('\n');
    }

    if out.ends_with("\n\n") {
        out.pop();
    }
    Ok(out)
}

/// Render and write the copyright file to `path`
pub fn write_copyright_file(model: &PackageModel, path: &Path) -> AuditResult<()> {
    let contents = render_copyright_file(model)?;
    std::fs::write(path, contents)?;
    tracing::info!("Wrote copyright file for {} to {}", model.name(), path.display());
    Ok(())
}
