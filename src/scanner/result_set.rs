use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::rules::{Finding, FindingKey};

/// Append-only, deduplicating accumulator shared by scan workers.
///
/// Two findings with the same rule, address, range and description are the
/// same finding; the first one inserted is kept.
#[derive(Debug, Default)]
pub struct ResultSet {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<FindingKey>,
    findings: Vec<Finding>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finding. Returns false if an identical one is already held.
    pub fn insert(&self, finding: Finding) -> bool {
        let mut inner = self.lock();
        if !inner.seen.insert(finding.key()) {
            return false;
        }
        inner.findings.push(finding);
        true
    }

    /// Insert a batch under one lock acquisition.
    pub fn extend(&self, findings: impl IntoIterator<Item = Finding>) {
        let mut inner = self.lock();
        for finding in findings {
            if inner.seen.insert(finding.key()) {
                inner.findings.push(finding);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Findings in insertion order.
    pub fn into_findings(self) -> Vec<Finding> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .findings
    }

    // A panicking rule is caught outside the lock, so a poisoned mutex still
    // holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
