use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Finding, Severity};
use crate::config::Config;

/// Pass/fail summary of the final findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_findings: usize,
    pub highest_severity: Option<Severity>,
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Apply exclusions and severity overrides.
///
/// Exclusion always wins: an excluded rule's findings are dropped even when
/// the same rule also has an override.
pub fn apply(config: &Config, findings: Vec<Finding>) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|f| !config.excluded_checks.contains(&f.rule_id))
        .map(|mut f| {
            if let Some(&severity) = config.severity_overrides.get(&f.rule_id) {
                f.severity = severity;
            }
            f
        })
        .collect()
}

/// Summarize final findings. Any remaining finding fails the scan.
pub fn evaluate(findings: &[Finding]) -> PolicyVerdict {
    let mut by_severity = BTreeMap::new();
    for f in findings {
        *by_severity.entry(f.severity).or_insert(0) += 1;
    }

    PolicyVerdict {
        pass: findings.is_empty(),
        total_findings: findings.len(),
        highest_severity: findings.iter().map(|f| f.severity).max(),
        by_severity,
    }
}
