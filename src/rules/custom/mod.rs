//! User-defined checks loaded from `*_tfchecks.{json,yaml,yml}` files.

pub mod match_spec;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Finding, Provider, Rule, RuleMetadata, RuleRegistry, Severity};
use crate::config::DocumentFormat;
use crate::error::{Result, ScanError};
use crate::ir::{Block, Context};

pub use match_spec::{Action, CompiledMatchSpec, MatchSpecDocument, MatchSpecError};

/// File name suffixes picked up from a checks directory.
pub const CHECK_FILE_SUFFIXES: &[&str] = &["_tfchecks.json", "_tfchecks.yaml", "_tfchecks.yml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckFile {
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

/// One check as written by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDefinition {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_types: Vec<String>,
    #[serde(default)]
    pub required_labels: Vec<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub related_links: Vec<String>,
    #[serde(default)]
    pub match_spec: Option<MatchSpecDocument>,
}

/// A compiled custom check.
///
/// The matchSpec describes the compliant configuration: the rule reports a
/// block when its root node evaluates to false.
#[derive(Debug, Clone)]
pub struct CustomRule {
    metadata: RuleMetadata,
    error_message: Option<String>,
    spec: CompiledMatchSpec,
}

impl CustomRule {
    pub fn spec(&self) -> &CompiledMatchSpec {
        &self.spec
    }
}

impl Rule for CustomRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn evaluate(&self, block: &Block, ctx: &Context) -> Vec<Finding> {
        if self.spec.matches(block, ctx) {
            return Vec::new();
        }
        let message = self
            .error_message
            .clone()
            .unwrap_or_else(|| self.metadata.description.clone());
        vec![Finding::new(&self.metadata, block, message)]
    }
}

/// Load and compile every check in one file.
///
/// IDs already in `registry` are rejected, as are duplicates within the file.
pub fn load_check_file(path: &Path, registry: &RuleRegistry) -> Result<Vec<CustomRule>> {
    let mut seen = BTreeSet::new();
    load_into(path, registry, &mut seen)
}

/// Load every `*_tfchecks.*` file in `dir`, in file name order.
///
/// The whole directory is one batch: an ID defined in two files is a
/// collision. A missing directory yields no checks.
pub fn load_checks_dir(dir: &Path, registry: &RuleRegistry) -> Result<Vec<CustomRule>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut seen = BTreeSet::new();
    let mut rules = Vec::new();
    for path in discover_check_files(dir)? {
        rules.extend(load_into(&path, registry, &mut seen)?);
    }
    tracing::debug!(dir = %dir.display(), count = rules.len(), "loaded custom checks");
    Ok(rules)
}

fn discover_check_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut files = Vec::new();
    for suffix in CHECK_FILE_SUFFIXES {
        let pattern = format!("{}/*{}", base, suffix);
        let paths = glob::glob(&pattern)
            .map_err(|e| ScanError::Config(format!("bad check file pattern {}: {}", pattern, e)))?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable check file"),
            }
        }
    }
    files.sort();
    Ok(files)
}

fn load_into(
    path: &Path,
    registry: &RuleRegistry,
    seen: &mut BTreeSet<String>,
) -> Result<Vec<CustomRule>> {
    let format = match DocumentFormat::from_path(path)? {
        DocumentFormat::Toml => return Err(ScanError::UnsupportedFormat(path.display().to_string())),
        other => other,
    };
    let content = std::fs::read_to_string(path)?;
    let file: CheckFile = format.parse(&content)?;
    compile_checks(&path.display().to_string(), &file, registry, seen)
}

/// Compile a parsed check document. Fails on the first invalid check; no
/// rule from a failing document is returned.
pub fn compile_checks(
    file: &str,
    doc: &CheckFile,
    registry: &RuleRegistry,
    seen: &mut BTreeSet<String>,
) -> Result<Vec<CustomRule>> {
    doc.checks
        .iter()
        .map(|check| {
            let rule = compile_check(check).map_err(|message| ScanError::CustomCheck {
                file: file.to_owned(),
                code: if check.code.is_empty() {
                    "<missing>".to_owned()
                } else {
                    check.code.clone()
                },
                message,
            })?;
            let id = &rule.metadata.id;
            if registry.contains(id) || !seen.insert(id.clone()) {
                return Err(ScanError::CustomCheck {
                    file: file.to_owned(),
                    code: id.clone(),
                    message: "check code collides with an existing rule".into(),
                });
            }
            Ok(rule)
        })
        .collect()
}

fn compile_check(check: &CheckDefinition) -> std::result::Result<CustomRule, String> {
    if check.code.trim().is_empty() {
        return Err("check has no code".into());
    }
    if check.required_types.is_empty() {
        return Err("requiredTypes must name at least one block type".into());
    }
    let default_severity = match &check.severity {
        Some(token) => Severity::normalize(token).map_err(|e| e.to_string())?,
        None => Severity::Medium,
    };
    let doc = check
        .match_spec
        .as_ref()
        .ok_or_else(|| "check has no matchSpec".to_owned())?;
    let spec = CompiledMatchSpec::compile(doc).map_err(|e| e.to_string())?;

    Ok(CustomRule {
        metadata: RuleMetadata {
            id: check.code.clone(),
            provider: Provider::Custom,
            description: check.description.clone(),
            required_types: check.required_types.clone(),
            required_labels: check.required_labels.clone(),
            default_severity,
            impact: check.impact.clone(),
            resolution: check.resolution.clone(),
            links: check.related_links.clone(),
        },
        error_message: check.error_message.clone(),
        spec,
    })
}
