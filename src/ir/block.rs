use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::values_equal;
use super::{SourceRange, Value};

/// Instance key assigned by `count` or `for_each` expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKey {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{}]", i),
            Self::Key(k) => write!(f, "[\"{}\"]", k),
        }
    }
}

/// A named value on a block.
///
/// `value` is `None` when the expression could not be resolved (unknown
/// variable, function call, reference to something outside the scanned
/// tree). The attribute is still declared, so presence checks see it, but
/// value comparisons never match it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Option<Value>,
    range: SourceRange,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<Value>, range: SourceRange) -> Self {
        Self {
            name: name.into(),
            value,
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_known(&self) -> bool {
        self.value.is_some()
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value.as_ref()? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_bool() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.as_bool() == Some(false)
    }

    pub fn equals(&self, other: &Value) -> bool {
        self.value.as_ref().is_some_and(|v| values_equal(v, other))
    }

    pub fn contains(&self, needle: &Value) -> bool {
        self.value
            .as_ref()
            .is_some_and(|v| super::value::value_contains(v, needle))
    }
}

/// A typed, labeled configuration node after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    kind: String,
    labels: Vec<String>,
    module_path: Vec<String>,
    instance: Option<InstanceKey>,
    /// Provider alias, appended after the labels.
    alias: Option<String>,
    /// Position among earlier blocks that would otherwise share the address.
    ordinal: Option<usize>,
    address: String,
    attributes: BTreeMap<String, Attribute>,
    children: Vec<Block>,
    range: SourceRange,
}

impl Block {
    pub fn new(kind: impl Into<String>, labels: Vec<String>, range: SourceRange) -> Self {
        let mut block = Self {
            kind: kind.into(),
            labels,
            module_path: Vec::new(),
            instance: None,
            alias: None,
            ordinal: None,
            address: String::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            range,
        };
        block.address = block.top_level_address();
        block
    }

    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        let range = self.range.clone();
        self.set_attribute(Attribute::new(name, Some(value), range));
        self
    }

    pub fn with_unknown_attribute(mut self, name: &str) -> Self {
        let range = self.range.clone();
        self.set_attribute(Attribute::new(name, None, range));
        self
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.push_child(child);
        self
    }

    pub fn in_module(mut self, module_path: Vec<String>) -> Self {
        self.module_path = module_path;
        self.address = self.top_level_address();
        self.readdress_children();
        self
    }

    pub fn with_instance(mut self, key: InstanceKey) -> Self {
        self.instance = Some(key);
        self.address = self.top_level_address();
        self.readdress_children();
        self
    }

    /// Qualify a `provider` block with its `alias`: `provider.aws.us`.
    pub fn with_alias(mut self, alias: String) -> Self {
        self.alias = Some(alias);
        self.address = self.top_level_address();
        self.readdress_children();
        self
    }

    /// Distinguish the `n`th repeat of an address, e.g. a second `locals`
    /// block becomes `locals[1]`.
    pub fn with_ordinal(mut self, n: usize) -> Self {
        self.ordinal = Some(n);
        self.address = self.top_level_address();
        self.readdress_children();
        self
    }

    pub fn set_attribute(&mut self, attribute: Attribute) {
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    pub fn push_child(&mut self, mut child: Block) {
        let base = format!("{}.{}", self.address, child.kind);
        let siblings = self.children.iter().filter(|c| c.kind == child.kind).count();
        child.address = if siblings == 0 {
            base
        } else {
            format!("{}[{}]", base, siblings)
        };
        child.module_path = self.module_path.clone();
        child.readdress_children();
        self.children.push(child);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// First label, e.g. `aws_s3_bucket` for a resource.
    pub fn type_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn module_path(&self) -> &[String] {
        &self.module_path
    }

    pub fn in_child_module(&self) -> bool {
        !self.module_path.is_empty()
    }

    pub fn full_name(&self) -> &str {
        &self.address
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn get_block(&self, kind: &str) -> Option<&Block> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn get_blocks(&self, kind: &str) -> Vec<&Block> {
        self.children.iter().filter(|c| c.kind == kind).collect()
    }

    /// An attribute or a child block with this name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.children.iter().any(|c| c.kind == name)
    }

    pub fn missing_child(&self, name: &str) -> bool {
        !self.has_child(name)
    }

    fn top_level_address(&self) -> String {
        let mut parts: Vec<String> = self
            .module_path
            .iter()
            .map(|m| format!("module.{}", m))
            .collect();
        let mut own = match self.kind.as_str() {
            "resource" => self.labels.join("."),
            "variable" => format!("var.{}", self.labels.join(".")),
            _ if self.labels.is_empty() => self.kind.clone(),
            _ => format!("{}.{}", self.kind, self.labels.join(".")),
        };
        if let Some(alias) = &self.alias {
            own.push('.');
            own.push_str(alias);
        }
        parts.push(own);
        let mut address = parts.join(".");
        if let Some(key) = &self.instance {
            address.push_str(&key.to_string());
        }
        if let Some(n) = self.ordinal {
            address.push_str(&format!("[{}]", n));
        }
        address
    }

    fn readdress_children(&mut self) {
        let children = std::mem::take(&mut self.children);
        for child in children {
            self.push_child(child);
        }
    }
}
