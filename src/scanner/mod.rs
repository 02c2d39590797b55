//! Runs rules over a resolved context.

pub mod result_set;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::ir::{Block, Context};
use crate::rules::{policy, Finding, Rule, RuleRegistry};

pub use result_set::ResultSet;

/// A rule evaluation that failed instead of producing findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub address: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub blocks: usize,
    pub evaluations: usize,
    pub ignored: usize,
    pub excluded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Final findings, ordered by file, start line, end line, rule, address.
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ScanStats,
}

/// Evaluates every gated (block, rule) pair in parallel, then applies
/// inline ignores and the config post-pass.
pub struct Scanner {
    registry: RuleRegistry,
    config: Config,
    threads: Option<usize>,
    include_ignored: bool,
    cancel: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(registry: RuleRegistry, config: Config) -> Self {
        Self {
            registry,
            config,
            threads: None,
            include_ignored: false,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Size of the worker pool. `None` uses the available parallelism.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Keep findings suppressed by `tfsec:ignore` comments.
    pub fn with_include_ignored(mut self, include: bool) -> Self {
        self.include_ignored = include;
        self
    }

    /// Share a cancellation flag. Workers stop picking up new blocks once it
    /// is set.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn scan(&self, ctx: &Context) -> Result<ScanOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.unwrap_or(0))
            .build()
            .map_err(|e| ScanError::Internal(format!("cannot start worker pool: {}", e)))?;

        let results = ResultSet::new();
        let diagnostics = Mutex::new(Vec::new());
        let evaluations = AtomicUsize::new(0);

        pool.install(|| {
            ctx.blocks().par_iter().try_for_each(|block| {
                if self.cancel.load(Ordering::Relaxed) {
                    return Err(ScanError::Cancelled);
                }
                for rule in self.registry.iter().filter(|r| r.applies_to(block)) {
                    evaluations.fetch_add(1, Ordering::Relaxed);
                    match evaluate_isolated(rule, block, ctx) {
                        Ok(findings) => results.extend(findings),
                        Err(diagnostic) => diagnostics
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(diagnostic),
                    }
                }
                Ok(())
            })
        })?;

        let mut stats = ScanStats {
            blocks: ctx.blocks().len(),
            evaluations: evaluations.into_inner(),
            ..Default::default()
        };

        let mut findings = results.into_findings();
        if !self.include_ignored {
            let before = findings.len();
            findings.retain(|f| !ctx.is_ignored(&f.rule_id, &f.range));
            stats.ignored = before - findings.len();
        }

        let before = findings.len();
        let mut findings = policy::apply(&self.config, findings);
        stats.excluded = before - findings.len();

        findings.sort_by(|a, b| {
            a.range
                .cmp(&b.range)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
                .then_with(|| a.address.cmp(&b.address))
        });

        let mut diagnostics = diagnostics
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        diagnostics.sort_by(|a, b| (&a.address, &a.rule_id).cmp(&(&b.address, &b.rule_id)));

        tracing::info!(
            blocks = stats.blocks,
            evaluations = stats.evaluations,
            findings = findings.len(),
            ignored = stats.ignored,
            excluded = stats.excluded,
            diagnostics = diagnostics.len(),
            "scan complete"
        );

        Ok(ScanOutcome {
            findings,
            diagnostics,
            stats,
        })
    }
}

fn evaluate_isolated(
    rule: &dyn Rule,
    block: &Block,
    ctx: &Context,
) -> std::result::Result<Vec<Finding>, Diagnostic> {
    panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(block, ctx))).map_err(|payload| {
        let rule_id = rule.metadata().id.clone();
        let message = panic_message(payload.as_ref());
        tracing::warn!(
            rule_id = %rule_id,
            address = %block.full_name(),
            error = %message,
            "rule evaluation panicked"
        );
        Diagnostic {
            rule_id,
            address: block.full_name().to_owned(),
            message,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_owned()
    }
}
