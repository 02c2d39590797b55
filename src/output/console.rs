use crate::rules::{Finding, Severity};
use crate::ScanReport;

/// Render findings as plain console output, in report order.
pub fn render(report: &ScanReport) -> String {
    let findings = &report.findings;
    let mut output = String::new();

    if findings.is_empty() {
        output.push_str("\n  No problems detected.\n\n");
    } else {
        output.push_str(&format!("\n  {} problem(s) detected:\n\n", findings.len()));
        for finding in findings {
            push_finding(&mut output, finding);
        }
    }

    if !report.diagnostics.is_empty() {
        output.push_str(&format!(
            "  {} rule evaluation(s) failed:\n",
            report.diagnostics.len()
        ));
        for d in &report.diagnostics {
            output.push_str(&format!("    {} on {}: {}\n", d.rule_id, d.address, d.message));
        }
        output.push('\n');
    }

    let verdict = &report.verdict;
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} (blocks: {}, checks run: {}, ignored: {}, excluded: {}, highest: {})\n\n",
        status,
        report.stats.blocks,
        report.stats.evaluations,
        report.stats.ignored,
        report.stats.excluded,
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}

fn push_finding(output: &mut String, finding: &Finding) {
    let severity_tag = match finding.severity {
        Severity::Critical => "[CRITICAL]",
        Severity::High => "[HIGH]    ",
        Severity::Medium => "[MEDIUM]  ",
        Severity::Low => "[LOW]     ",
    };

    output.push_str(&format!(
        "  {} {} {}\n",
        severity_tag, finding.rule_id, finding.description
    ));
    output.push_str(&format!("           at {} ({})\n", finding.range, finding.address));
    if let Some(impact) = &finding.impact {
        output.push_str(&format!("           impact: {}\n", impact));
    }
    if let Some(resolution) = &finding.resolution {
        output.push_str(&format!("           fix: {}\n", resolution));
    }
    for link in &finding.links {
        output.push_str(&format!("           see: {}\n", link));
    }
    output.push('\n');
}
