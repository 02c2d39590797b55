use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Block, SourceRange, Value};

/// A `module` call that the resolver followed into a local directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCall {
    /// Address of the call, e.g. `module.network` or `module.a.module.b`.
    pub address: String,
    /// The `source` attribute as written.
    pub source: String,
    /// Directory the source resolved to.
    pub directory: PathBuf,
}

/// An inline `tfsec:ignore:<RULE>` comment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IgnoreDirective {
    pub file: PathBuf,
    pub line: usize,
    /// Rule ID, or `*` for every rule.
    pub rule_id: String,
}

impl IgnoreDirective {
    /// Directives apply to the line they sit on and the line below.
    pub fn covers(&self, rule_id: &str, range: &SourceRange) -> bool {
        self.file == range.file
            && (self.line == range.start_line || self.line + 1 == range.start_line)
            && (self.rule_id == "*" || self.rule_id.eq_ignore_ascii_case(rule_id))
    }
}

/// The resolved view of a module tree.
///
/// Built once by the resolver and never mutated afterwards; the scanner
/// shares it across worker threads by reference.
#[derive(Debug, Clone, Default)]
pub struct Context {
    blocks: Vec<Block>,
    variables: BTreeMap<String, Value>,
    locals: BTreeMap<String, Value>,
    modules: Vec<ModuleCall>,
    ignores: Vec<IgnoreDirective>,
}

impl Context {
    /// Context over an explicit set of blocks, without variables or modules.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    pub(crate) fn new(
        blocks: Vec<Block>,
        variables: BTreeMap<String, Value>,
        locals: BTreeMap<String, Value>,
        modules: Vec<ModuleCall>,
        ignores: Vec<IgnoreDirective>,
    ) -> Self {
        Self {
            blocks,
            variables,
            locals,
            modules,
            ignores,
        }
    }

    pub fn with_ignores(mut self, ignores: Vec<IgnoreDirective>) -> Self {
        self.ignores = ignores;
        self
    }

    /// Every top-level block instance across the module tree, after expansion.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.kind() == kind)
    }

    /// Blocks whose first label matches, e.g. every `aws_s3_bucket` resource.
    pub fn blocks_with_type<'a>(&'a self, type_label: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks
            .iter()
            .filter(move |b| b.type_label() == Some(type_label))
    }

    pub fn find(&self, address: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.full_name() == address)
    }

    /// Root module variable value.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Root module local value.
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn modules(&self) -> &[ModuleCall] {
        &self.modules
    }

    pub fn is_ignored(&self, rule_id: &str, range: &SourceRange) -> bool {
        self.ignores.iter().any(|d| d.covers(rule_id, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(type_label: &str, name: &str) -> Block {
        Block::new(
            "resource",
            vec![type_label.into(), name.into()],
            SourceRange::new("main.tf", 1, 3),
        )
    }

    #[test]
    fn all_blocks_is_restartable() {
        let ctx = Context::from_blocks(vec![block("aws_s3_bucket", "a"), block("aws_s3_bucket", "b")]);
        assert_eq!(ctx.all_blocks().count(), 2);
        assert_eq!(ctx.all_blocks().count(), 2);
    }

    #[test]
    fn lookup_by_type_and_address() {
        let ctx = Context::from_blocks(vec![block("aws_s3_bucket", "a"), block("aws_vpc", "main")]);
        assert_eq!(ctx.blocks_with_type("aws_vpc").count(), 1);
        assert!(ctx.find("aws_s3_bucket.a").is_some());
        assert!(ctx.find("aws_s3_bucket.zzz").is_none());
    }

    #[test]
    fn ignore_covers_same_and_next_line() {
        let directive = IgnoreDirective {
            file: PathBuf::from("main.tf"),
            line: 4,
            rule_id: "AWS002".into(),
        };
        assert!(directive.covers("AWS002", &SourceRange::new("main.tf", 4, 9)));
        assert!(directive.covers("aws002", &SourceRange::new("main.tf", 5, 9)));
        assert!(!directive.covers("AWS002", &SourceRange::new("main.tf", 6, 9)));
        assert!(!directive.covers("AWS017", &SourceRange::new("main.tf", 5, 9)));
        assert!(!directive.covers("AWS002", &SourceRange::new("other.tf", 5, 9)));
    }

    #[test]
    fn wildcard_ignore_covers_every_rule() {
        let ctx = Context::default().with_ignores(vec![IgnoreDirective {
            file: PathBuf::from("main.tf"),
            line: 1,
            rule_id: "*".into(),
        }]);
        assert!(ctx.is_ignored("GEN003", &SourceRange::new("main.tf", 2, 2)));
    }
}
