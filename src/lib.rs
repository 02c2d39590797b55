//! tfsentry: static security scanner for Terraform configuration.
//!
//! Parses a module tree, resolves variables, locals, modules and resource
//! expansion into an immutable context, then runs built-in and user-defined
//! checks over every block in parallel.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use tfsentry::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan(Path::new("./infra"), &options).unwrap();
//! println!("Pass: {}, Findings: {}", report.verdict.pass, report.findings.len());
//! ```

pub mod config;
pub mod error;
pub mod ir;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod rules;
pub mod scanner;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use config::{Config, CONFIG_DIR};
use error::{Result, ScanError};
use output::OutputFormat;
use rules::policy::{self, PolicyVerdict};
use rules::{builtin, custom, Finding, RuleRegistry};
use scanner::{Diagnostic, ScanStats, Scanner};

/// Options for a scan invocation.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Config file. Defaults to `.tfsec/config.*` in the scan directory.
    pub config_path: Option<PathBuf>,
    /// Directory of `*_tfchecks.*` files. Defaults to `.tfsec` in the scan directory.
    pub custom_checks_dir: Option<PathBuf>,
    /// Report findings suppressed by inline ignore comments.
    pub include_ignored: bool,
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Set to stop the scan early.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Complete scan report.
#[derive(Debug)]
pub struct ScanReport {
    pub root: PathBuf,
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub verdict: PolicyVerdict,
    pub stats: ScanStats,
    pub started_at: DateTime<Utc>,
}

/// Run a complete scan: load config and checks, resolve, evaluate, apply policy.
pub fn scan(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let started_at = Utc::now();

    let config = match &options.config_path {
        Some(config_path) => Config::load(config_path)?,
        None => Config::discover(path)?,
    };
    let registry = load_registry(path, options.custom_checks_dir.as_deref())?;

    let ctx = resolver::resolve(path)?;

    let mut scanner = Scanner::new(registry, config)
        .with_threads(options.threads)
        .with_include_ignored(options.include_ignored);
    if let Some(cancel) = &options.cancel {
        scanner = scanner.with_cancel_flag(Arc::clone(cancel));
    }
    let outcome = scanner.scan(&ctx)?;

    Ok(ScanReport {
        root: path.to_path_buf(),
        verdict: policy::evaluate(&outcome.findings),
        findings: outcome.findings,
        diagnostics: outcome.diagnostics,
        stats: outcome.stats,
        started_at,
    })
}

/// Built-in catalog plus the custom checks found for `root`.
///
/// An explicitly named checks directory must exist; the default
/// `.tfsec` directory is optional.
pub fn load_registry(root: &Path, custom_checks_dir: Option<&Path>) -> Result<RuleRegistry> {
    let mut registry = builtin::catalog();

    let dir = match custom_checks_dir {
        Some(dir) if !dir.is_dir() => {
            return Err(ScanError::Config(format!(
                "custom checks directory not found: {}",
                dir.display()
            )))
        }
        Some(dir) => dir.to_path_buf(),
        None => root.join(CONFIG_DIR),
    };

    for rule in custom::load_checks_dir(&dir, &registry)? {
        registry.register(Box::new(rule));
    }
    Ok(registry)
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}
