use std::collections::BTreeMap;

use hcl::eval::Evaluate;
use serde::Deserialize;
use serde_json::Map;

use crate::ir::{Block, Value};

/// Names bound while resolving one module: `var.*`, `local.*`,
/// `module.*`, `data.*` and one top-level name per resource type.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Scope {
    pub vars: Map<String, Value>,
    pub locals: Map<String, Value>,
    pub modules: Map<String, Value>,
    pub data: BTreeMap<String, Map<String, Value>>,
    pub resources: BTreeMap<String, Map<String, Value>>,
}

/// Extra names bound for one block instance (`count`, `each`, a dynamic
/// block's iterator).
pub(crate) type Bindings = Vec<(String, Value)>;

impl Scope {
    /// A child module starts from its parent's variables, so names the
    /// child does not declare fall back to the parent scope.
    pub fn inheriting(parent_vars: &Map<String, Value>) -> Self {
        Self {
            vars: parent_vars.clone(),
            ..Default::default()
        }
    }

    pub fn frame(&self, bindings: &[(String, Value)]) -> hcl::eval::Context<'static> {
        let mut ctx = hcl::eval::Context::new();
        ctx.declare_var("var", to_hcl(Value::Object(self.vars.clone())));
        ctx.declare_var("local", to_hcl(Value::Object(self.locals.clone())));
        ctx.declare_var("module", to_hcl(Value::Object(self.modules.clone())));

        let data: Map<String, Value> = self
            .data
            .iter()
            .map(|(ty, instances)| (ty.clone(), Value::Object(instances.clone())))
            .collect();
        ctx.declare_var("data", to_hcl(Value::Object(data)));

        for (ty, instances) in &self.resources {
            ctx.declare_var(ty.clone(), to_hcl(Value::Object(instances.clone())));
        }
        for (name, value) in bindings {
            ctx.declare_var(name.clone(), to_hcl(value.clone()));
        }
        ctx
    }

    /// Evaluate against this scope with no extra bindings.
    pub fn evaluate(&self, expr: &hcl::Expression) -> Option<Value> {
        evaluate(expr, &self.frame(&[]))
    }

    /// Make a resolved resource or data instance referenceable by later blocks.
    pub fn register(&mut self, kind: &str, type_label: &str, name: &str, value: Value) {
        let table = match kind {
            "resource" => &mut self.resources,
            "data" => &mut self.data,
            _ => return,
        };
        table
            .entry(type_label.to_owned())
            .or_default()
            .insert(name.to_owned(), value);
    }
}

/// Evaluate an expression; anything unresolvable yields `None`.
pub(crate) fn evaluate(expr: &hcl::Expression, frame: &hcl::eval::Context) -> Option<Value> {
    match expr.evaluate(frame) {
        Ok(value) => serde_json::to_value(&value).ok(),
        Err(errors) => {
            tracing::debug!(error = %errors, "expression left unknown");
            None
        }
    }
}

fn to_hcl(value: Value) -> hcl::Value {
    hcl::Value::deserialize(value).unwrap_or(hcl::Value::Null)
}

/// Object view of a resolved block, as seen through a reference like
/// `aws_s3_bucket.logs.bucket`. Unknown attributes are left out.
pub(crate) fn block_value(block: &Block) -> Value {
    let mut map: Map<String, Value> = block
        .attributes()
        .filter_map(|attr| attr.value().map(|v| (attr.name().to_owned(), v.clone())))
        .collect();

    for child in block.children() {
        let entry = map
            .entry(child.kind().to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(block_value(child));
        }
    }

    Value::Object(map)
}
