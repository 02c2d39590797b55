//! The matchSpec pattern language used by custom checks.
//!
//! A document tree is compiled once into a [`CompiledMatchSpec`] with typed
//! operands, then evaluated against every block that passes the rule gate.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::value::{as_number, is_empty, scalar_text, value_contains, values_equal};
use crate::ir::{Block, Context, Value};

/// A matchSpec node as written in a check file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpecDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_match: Option<Box<MatchSpecDocument>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicate_match_spec: Vec<MatchSpecDocument>,
}

#[derive(Debug, Error)]
pub enum MatchSpecError {
    #[error("matchSpec node has no action")]
    MissingAction,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{0}' requires an attribute name")]
    MissingName(String),

    #[error("action '{action}' requires {expected} value")]
    BadOperand {
        action: String,
        expected: &'static str,
    },

    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("action '{action}' expects {expected} predicateMatchSpec entries, found {found}")]
    PredicateCount {
        action: String,
        expected: &'static str,
        found: usize,
    },
}

/// Closed action vocabulary with compiled operands.
#[derive(Debug, Clone)]
pub enum Action {
    IsPresent,
    NotPresent,
    IsEmpty,
    Equals(Value),
    NotEqual(Value),
    Contains(Value),
    NotContains(Value),
    StartsWith(String),
    EndsWith(String),
    RegexMatches(Regex),
    IsAny(Vec<Value>),
    IsNone(Vec<Value>),
    GreaterThan(f64),
    LessThan(f64),
    RequiresPresence(String),
    InModule,
    And(Vec<CompiledMatchSpec>),
    Or(Vec<CompiledMatchSpec>),
    Not(Box<CompiledMatchSpec>),
}

impl Action {
    /// Actions that look up `name` on the target.
    fn selects_attribute(&self) -> bool {
        !matches!(
            self,
            Self::RequiresPresence(_) | Self::InModule | Self::And(_) | Self::Or(_) | Self::Not(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct CompiledMatchSpec {
    name: Option<String>,
    action: Action,
    sub_match: Option<Box<CompiledMatchSpec>>,
}

/// What a node is evaluated against.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Block(&'a Block),
    Value(&'a Value),
    /// A scalar or missing parent: every name is absent.
    Nothing,
}

/// Result of resolving `name` on a target.
#[derive(Debug)]
enum Selected<'a> {
    Absent,
    Unknown,
    Value(&'a Value),
    Blocks(Vec<&'a Block>),
}

impl CompiledMatchSpec {
    pub fn compile(doc: &MatchSpecDocument) -> Result<Self, MatchSpecError> {
        let action_name = doc.action.as_deref().ok_or(MatchSpecError::MissingAction)?;
        let action = compile_action(action_name, doc)?;

        let name = doc.name.clone().filter(|n| !n.is_empty());
        if name.is_none() && action.selects_attribute() {
            return Err(MatchSpecError::MissingName(action_name.to_owned()));
        }

        let sub_match = doc
            .sub_match
            .as_deref()
            .map(|sub| Self::compile(sub).map(Box::new))
            .transpose()?;

        Ok(Self {
            name,
            action,
            sub_match,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Evaluate the tree rooted at this node against a block.
    pub fn matches(&self, block: &Block, ctx: &Context) -> bool {
        self.eval(Target::Block(block), block, ctx)
    }

    fn eval(&self, target: Target<'_>, origin: &Block, ctx: &Context) -> bool {
        let selected = match &self.name {
            Some(name) if self.action.selects_attribute() || self.sub_match.is_some() => {
                select(target, name)
            }
            _ => Selected::Absent,
        };

        if !self.action_holds(&selected, target, origin, ctx) {
            return false;
        }
        match &self.sub_match {
            Some(sub) => sub.eval_within(&selected, origin, ctx),
            None => true,
        }
    }

    /// Evaluate as a subMatch: the parent's selection becomes the target.
    fn eval_within(&self, parent: &Selected<'_>, origin: &Block, ctx: &Context) -> bool {
        match parent {
            Selected::Value(Value::Array(items)) => items
                .iter()
                .any(|item| self.eval(Target::Value(item), origin, ctx)),
            Selected::Value(value) => self.eval(Target::Value(value), origin, ctx),
            Selected::Blocks(blocks) => blocks
                .iter()
                .any(|&b| self.eval(Target::Block(b), origin, ctx)),
            Selected::Absent | Selected::Unknown => self.eval(Target::Nothing, origin, ctx),
        }
    }

    fn action_holds(
        &self,
        selected: &Selected<'_>,
        target: Target<'_>,
        origin: &Block,
        ctx: &Context,
    ) -> bool {
        let value = match selected {
            Selected::Value(v) => Some(*v),
            _ => None,
        };

        match &self.action {
            Action::IsPresent => !matches!(selected, Selected::Absent),
            Action::NotPresent => matches!(selected, Selected::Absent),
            Action::IsEmpty => match selected {
                Selected::Value(v) => is_empty(v),
                Selected::Blocks(blocks) => blocks
                    .iter()
                    .all(|b| b.attributes().next().is_none() && b.children().is_empty()),
                _ => false,
            },
            Action::Equals(op) => value.is_some_and(|v| values_equal(v, op)),
            Action::NotEqual(op) => value.is_some_and(|v| !values_equal(v, op)),
            Action::Contains(op) => value.is_some_and(|v| value_contains(v, op)),
            Action::NotContains(op) => value.is_some_and(|v| !value_contains(v, op)),
            Action::StartsWith(prefix) => value
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Action::EndsWith(suffix) => value
                .and_then(Value::as_str)
                .is_some_and(|s| s.ends_with(suffix.as_str())),
            Action::RegexMatches(re) => value
                .and_then(scalar_text)
                .is_some_and(|text| re.is_match(&text)),
            Action::IsAny(options) => {
                value.is_some_and(|v| options.iter().any(|o| values_equal(v, o)))
            }
            Action::IsNone(options) => {
                value.is_some_and(|v| !options.iter().any(|o| values_equal(v, o)))
            }
            Action::GreaterThan(limit) => value.and_then(as_number).is_some_and(|n| n > *limit),
            Action::LessThan(limit) => value.and_then(as_number).is_some_and(|n| n < *limit),
            Action::RequiresPresence(type_label) => {
                ctx.blocks_with_type(type_label).next().is_some()
            }
            Action::InModule => match target {
                Target::Block(b) => b.in_child_module(),
                _ => origin.in_child_module(),
            },
            Action::And(specs) => specs.iter().all(|s| s.eval(target, origin, ctx)),
            Action::Or(specs) => specs.iter().any(|s| s.eval(target, origin, ctx)),
            Action::Not(spec) => !spec.eval(target, origin, ctx),
        }
    }
}

fn select<'a>(target: Target<'a>, name: &str) -> Selected<'a> {
    match target {
        Target::Block(block) => {
            if let Some(attr) = block.get_attribute(name) {
                return match attr.value() {
                    Some(v) => Selected::Value(v),
                    None => Selected::Unknown,
                };
            }
            let children = block.get_blocks(name);
            if children.is_empty() {
                Selected::Absent
            } else {
                Selected::Blocks(children)
            }
        }
        Target::Value(Value::Object(map)) => match map.get(name) {
            Some(v) => Selected::Value(v),
            None => Selected::Absent,
        },
        Target::Value(_) | Target::Nothing => Selected::Absent,
    }
}

fn compile_action(action: &str, doc: &MatchSpecDocument) -> Result<Action, MatchSpecError> {
    let bad = |expected: &'static str| MatchSpecError::BadOperand {
        action: action.to_owned(),
        expected,
    };
    let operand = doc.value.as_ref();
    let scalar = || {
        operand
            .filter(|v| scalar_text(v).is_some())
            .cloned()
            .ok_or_else(|| bad("a string, number or boolean"))
    };
    let string = || {
        operand
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| bad("a string"))
    };
    let list = || match operand {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(bad("a list")),
    };
    let number = || operand.and_then(as_number).ok_or_else(|| bad("a numeric"));
    let predicates = |expected: &'static str, ok: fn(usize) -> bool| {
        let found = doc.predicate_match_spec.len();
        if !ok(found) {
            return Err(MatchSpecError::PredicateCount {
                action: action.to_owned(),
                expected,
                found,
            });
        }
        doc.predicate_match_spec
            .iter()
            .map(CompiledMatchSpec::compile)
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(match action {
        "isPresent" => Action::IsPresent,
        "notPresent" => Action::NotPresent,
        "isEmpty" => Action::IsEmpty,
        "equals" => Action::Equals(operand.cloned().ok_or_else(|| bad("a"))?),
        "notEqual" => Action::NotEqual(operand.cloned().ok_or_else(|| bad("a"))?),
        "contains" => Action::Contains(scalar()?),
        "notContains" => Action::NotContains(scalar()?),
        "startsWith" => Action::StartsWith(string()?),
        "endsWith" => Action::EndsWith(string()?),
        "regexMatches" => {
            let pattern = string()?;
            let re = Regex::new(&pattern)
                .map_err(|source| MatchSpecError::InvalidRegex { pattern, source })?;
            Action::RegexMatches(re)
        }
        "isAny" => Action::IsAny(list()?),
        "isNone" => Action::IsNone(list()?),
        "greaterThan" => Action::GreaterThan(number()?),
        "lessThan" => Action::LessThan(number()?),
        "requiresPresence" => Action::RequiresPresence(string()?),
        "inModule" => Action::InModule,
        "and" => Action::And(predicates("at least one", |n| n > 0)?),
        "or" => Action::Or(predicates("at least one", |n| n > 0)?),
        "not" => {
            let mut specs = predicates("exactly one", |n| n == 1)?;
            Action::Not(Box::new(specs.remove(0)))
        }
        other => return Err(MatchSpecError::UnknownAction(other.to_owned())),
    })
}
