use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::Result;
use crate::rules::{Finding, Severity};
use crate::ScanReport;

/// Render findings as SARIF 2.1.0.
///
/// Produces a self-contained SARIF log compatible with GitHub Code Scanning
/// and other SARIF consumers.
pub fn render(report: &ScanReport) -> Result<String> {
    let findings = &report.findings;

    let mut first_by_rule: BTreeMap<&str, &Finding> = BTreeMap::new();
    for f in findings {
        first_by_rule.entry(f.rule_id.as_str()).or_insert(f);
    }

    let rules: Vec<Value> = first_by_rule
        .values()
        .map(|finding| {
            let mut rule = json!({
                "id": finding.rule_id,
                "shortDescription": { "text": finding.description },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(finding.severity),
                },
                "properties": {
                    "provider": finding.provider.to_string(),
                },
            });
            if let Some(link) = finding.links.first() {
                rule["helpUri"] = json!(link);
            }
            if let Some(resolution) = &finding.resolution {
                rule["help"] = json!({ "text": resolution });
            }
            rule
        })
        .collect();

    let results: Vec<Value> = findings
        .iter()
        .map(|f| {
            let mut result = json!({
                "ruleId": f.rule_id,
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": f.description },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": f.range.file.display().to_string().replace('\\', "/"),
                        },
                        "region": {
                            "startLine": f.range.start_line.max(1),
                            "endLine": f.range.end_line.max(f.range.start_line).max(1),
                        },
                    },
                    "logicalLocations": [{
                        "fullyQualifiedName": f.address,
                    }],
                }],
                "partialFingerprints": {
                    "tfsentry/v1": f.fingerprint(),
                },
            });

            if let Some(resolution) = &f.resolution {
                result["fixes"] = json!([{
                    "description": { "text": resolution },
                }]);
            }

            result
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "tfsentry",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "invocations": [{
                "executionSuccessful": report.diagnostics.is_empty(),
                "startTimeUtc": report.started_at.to_rfc3339(),
            }],
            "automationDetails": {
                "id": format!("tfsentry/{}", report.root.display()),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}
