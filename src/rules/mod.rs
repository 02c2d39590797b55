pub mod builtin;
pub mod custom;
pub mod finding;
pub mod policy;

use std::collections::BTreeMap;

use crate::ir::{Block, Context};

pub use finding::{Finding, FindingKey, Provider, RuleMetadata, Severity};

/// A rule checks one resolved block and produces findings.
///
/// Evaluation must be pure: no I/O, no shared mutable state, no dependence
/// on other rules. The scanner relies on this to run rules in parallel.
pub trait Rule: Send + Sync {
    /// Identity, gate and documentation.
    fn metadata(&self) -> &RuleMetadata;

    /// Run the rule against a block that passed the gate.
    fn evaluate(&self, block: &Block, ctx: &Context) -> Vec<Finding>;

    /// Whether the scanner should call `evaluate` for this block.
    fn applies_to(&self, block: &Block) -> bool {
        self.metadata().applies_to(block)
    }
}

/// Signature of a compiled-in check.
pub type CheckFn = fn(&RuleMetadata, &Block, &Context) -> Vec<Finding>;

/// A rule backed by a plain function.
pub struct BuiltinRule {
    metadata: RuleMetadata,
    check: CheckFn,
}

impl BuiltinRule {
    pub fn new(metadata: RuleMetadata, check: CheckFn) -> Self {
        Self { metadata, check }
    }
}

impl Rule for BuiltinRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn evaluate(&self, block: &Block, ctx: &Context) -> Vec<Finding> {
        (self.check)(&self.metadata, block, ctx)
    }
}

/// Rules keyed by ID. Built explicitly and handed to the scanner.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Box<dyn Rule>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule. A rule with the same ID is replaced.
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let id = rule.metadata().id.clone();
        if self.rules.insert(id.clone(), rule).is_some() {
            tracing::debug!(rule_id = %id, "replaced previously registered rule");
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.rules.get(id).map(|boxed| boxed.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// All rules in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.values().map(|boxed| boxed.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// List metadata for all registered rules.
    pub fn list_rules(&self) -> Vec<RuleMetadata> {
        self.iter().map(|r| r.metadata().clone()).collect()
    }
}
