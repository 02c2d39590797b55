use std::collections::BTreeMap;

use serde_json::{json, Map};

use super::scope::{block_value, evaluate, Bindings, Scope};
use crate::ir::{value, Attribute, Block, InstanceKey, Value};
use crate::parser::RawBlock;

/// Largest `count` that is expanded. Anything above it keeps a single
/// unexpanded instance.
pub const MAX_COUNT: usize = 10_000;

pub(super) enum Repetition {
    Single,
    Count(usize),
    ForEach(Vec<(String, Value)>),
}

impl Repetition {
    /// Instance keys with the `count` / `each` bindings each instance sees.
    pub(super) fn instances(&self) -> Vec<(Option<InstanceKey>, Bindings)> {
        match self {
            Self::Single => vec![(None, Vec::new())],
            Self::Count(n) => (0..*n)
                .map(|i| {
                    (
                        Some(InstanceKey::Index(i)),
                        vec![("count".to_owned(), json!({ "index": i }))],
                    )
                })
                .collect(),
            Self::ForEach(entries) => entries
                .iter()
                .map(|(key, value)| {
                    (
                        Some(InstanceKey::Key(key.clone())),
                        vec![("each".to_owned(), json!({ "key": key, "value": value }))],
                    )
                })
                .collect(),
        }
    }

    /// The value a reference to the whole block sees: one object, a list
    /// for `count`, a map for `for_each`.
    pub(super) fn collect(&self, values: Vec<Value>) -> Option<Value> {
        match self {
            Self::Single => values.into_iter().next(),
            Self::Count(_) => Some(Value::Array(values)),
            Self::ForEach(entries) => Some(Value::Object(
                entries
                    .iter()
                    .zip(values)
                    .map(|((key, _), value)| (key.clone(), value))
                    .collect::<Map<String, Value>>(),
            )),
        }
    }
}

/// Resolve one raw block into its instances and register them in `scope`.
pub(super) fn expand(raw: &RawBlock, module_path: &[String], scope: &mut Scope) -> Vec<Block> {
    let repetition = if matches!(raw.kind.as_str(), "resource" | "data" | "module") {
        repetition(raw, scope)
    } else {
        Repetition::Single
    };

    let blocks: Vec<Block> = repetition
        .instances()
        .into_iter()
        .map(|(key, bindings)| {
            let frame = scope.frame(&bindings);
            let mut block = Block::new(raw.kind.clone(), raw.labels.clone(), raw.range.clone());
            populate(&mut block, raw, scope, &bindings, &frame);
            if raw.kind == "provider" {
                let alias = block
                    .get_attribute("alias")
                    .and_then(|a| a.as_str())
                    .map(str::to_owned);
                if let Some(alias) = alias {
                    block = block.with_alias(alias);
                }
            }
            let block = block.in_module(module_path.to_vec());
            match key {
                Some(key) => block.with_instance(key),
                None => block,
            }
        })
        .collect();

    if let (Some(type_label), Some(name)) = (raw.labels.first(), raw.labels.get(1)) {
        if let Some(value) = repetition.collect(blocks.iter().map(block_value).collect()) {
            scope.register(&raw.kind, type_label, name, value);
        }
    }

    blocks
}

/// How many instances `count` or `for_each` asks for. Unknown, fractional
/// or oversized values keep one unexpanded instance.
pub(super) fn repetition(raw: &RawBlock, scope: &Scope) -> Repetition {
    if let Some(attr) = raw.attribute("count") {
        return match scope.evaluate(&attr.expr).as_ref().and_then(value::as_number) {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= MAX_COUNT as f64 => {
                Repetition::Count(n as usize)
            }
            Some(n) => {
                tracing::debug!(
                    block = ?raw.labels,
                    count = n,
                    limit = MAX_COUNT,
                    "count is not a whole number within the limit, keeping one instance"
                );
                Repetition::Single
            }
            None => {
                tracing::debug!(block = ?raw.labels, "count left unknown, keeping one instance");
                Repetition::Single
            }
        };
    }

    if let Some(attr) = raw.attribute("for_each") {
        return match scope.evaluate(&attr.expr) {
            Some(value) => match for_each_entries(value) {
                Some(entries) => Repetition::ForEach(entries),
                None => Repetition::Single,
            },
            None => {
                tracing::debug!(block = ?raw.labels, "for_each left unknown, keeping one instance");
                Repetition::Single
            }
        };
    }

    Repetition::Single
}

/// Keys and values of a `for_each` collection: a map's entries, or a list
/// of strings used as both key and value. A list behaves as a set, so
/// repeated items collapse into one sorted key.
fn for_each_entries(collection: Value) -> Option<Vec<(String, Value)>> {
    match collection {
        Value::Object(map) => Some(map.into_iter().collect()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| value::scalar_text(&item).map(|key| (key, item)))
                .collect::<BTreeMap<String, Value>>()
                .into_iter()
                .collect(),
        ),
        _ => None,
    }
}

fn populate(
    block: &mut Block,
    raw: &RawBlock,
    scope: &Scope,
    bindings: &[(String, Value)],
    frame: &hcl::eval::Context,
) {
    for attr in &raw.attributes {
        block.set_attribute(Attribute::new(
            attr.name.clone(),
            evaluate(&attr.expr, frame),
            attr.range.clone(),
        ));
    }

    for child in &raw.blocks {
        if child.kind == "dynamic" {
            for expanded in expand_dynamic(child, scope, bindings, frame) {
                block.push_child(expanded);
            }
            continue;
        }
        let mut nested = Block::new(child.kind.clone(), child.labels.clone(), child.range.clone());
        populate(&mut nested, child, scope, bindings, frame);
        block.push_child(nested);
    }
}

/// `dynamic "<kind>" { for_each = ..., content { ... } }` becomes one
/// `<kind>` child per element, with `<iterator>.key` / `<iterator>.value`
/// bound inside `content`.
fn expand_dynamic(
    raw: &RawBlock,
    scope: &Scope,
    bindings: &[(String, Value)],
    frame: &hcl::eval::Context,
) -> Vec<Block> {
    let (Some(kind), Some(content)) = (raw.labels.first(), raw.block("content")) else {
        return Vec::new();
    };
    let iterator = raw
        .attribute("iterator")
        .map(|attr| attr.text.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| kind.clone());

    let entries = match raw
        .attribute("for_each")
        .and_then(|attr| evaluate(&attr.expr, frame))
    {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (json!(i), item))
            .collect::<Vec<_>>(),
        Some(Value::Object(map)) => map.into_iter().map(|(k, v)| (json!(k), v)).collect(),
        _ => {
            tracing::debug!(kind = %kind, "dynamic block for_each left unknown, skipping");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let mut inner: Bindings = bindings.to_vec();
            inner.push((iterator.clone(), json!({ "key": key, "value": value })));
            let inner_frame = scope.frame(&inner);
            let mut block = Block::new(kind.clone(), Vec::new(), content.range.clone());
            populate(&mut block, content, scope, &inner, &inner_frame);
            block
        })
        .collect()
}
