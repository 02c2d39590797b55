use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::rules::Finding;
use crate::scanner::{Diagnostic, ScanStats};
use crate::ScanReport;

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    generated_at: String,
    root: &'a Path,
    results: Vec<JsonFinding<'a>>,
    diagnostics: &'a [Diagnostic],
    verdict: &'a PolicyVerdict,
    stats: &'a ScanStats,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    #[serde(flatten)]
    finding: &'a Finding,
    fingerprint: String,
}

/// Render findings as a JSON report.
pub fn render(report: &ScanReport) -> Result<String> {
    let doc = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        generated_at: report.started_at.to_rfc3339(),
        root: &report.root,
        results: report
            .findings
            .iter()
            .map(|finding| JsonFinding {
                finding,
                fingerprint: finding.fingerprint(),
            })
            .collect(),
        diagnostics: &report.diagnostics,
        verdict: &report.verdict,
        stats: &report.stats,
    };
    let json = serde_json::to_string_pretty(&doc)?;
    Ok(json)
}
