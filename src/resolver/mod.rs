//! Turns a module directory tree into an immutable [`Context`].
//!
//! Resolution runs strictly before any rule evaluation. Variables are bound
//! first. Locals, module calls (depth first) and blocks with their `count` /
//! `for_each` / `dynamic` expansion are then resolved in repeated passes
//! until a pass leaves the scope unchanged, so a reference resolves no
//! matter which file or position declares its target. A module directory
//! entered while it is still being resolved is a fatal cycle. Every other
//! failure leaves the single affected attribute unknown.

mod expand;
pub(crate) mod scope;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Map;

use crate::error::{Result, ScanError};
use crate::ir::{Block, Context, IgnoreDirective, ModuleCall, Value};
use crate::parser::{self, ParsedModule, RawAttribute, RawBlock};
use scope::Scope;

pub use expand::MAX_COUNT;

/// Attributes of a `module` block that are not input variables.
const MODULE_META_ARGUMENTS: &[&str] = &[
    "source",
    "version",
    "count",
    "for_each",
    "providers",
    "depends_on",
];

/// Resolve the module rooted at `root`.
pub fn resolve(root: &Path) -> Result<Context> {
    let mut resolver = Resolver::default();
    let outcome = resolver.resolve_module(root, &[], Map::new(), &Map::new())?;

    let mut ignores = outcome.ignores;
    ignores.sort();
    ignores.dedup();
    let blocks = disambiguate(outcome.blocks);

    tracing::debug!(
        blocks = blocks.len(),
        modules = outcome.modules.len(),
        "resolution complete"
    );

    Ok(Context::new(
        blocks,
        outcome.variables.into_iter().collect(),
        outcome.locals.into_iter().collect(),
        outcome.modules,
        ignores,
    ))
}

#[derive(Default)]
struct Resolver {
    /// Canonical directories currently being resolved, outermost first.
    in_progress: Vec<PathBuf>,
    parsed: HashMap<PathBuf, Rc<ParsedModule>>,
    /// Finished modules by directory, address and inputs. Later passes of a
    /// parent reuse them while their inputs are unchanged.
    resolved: HashMap<String, ModuleOutcome>,
}

#[derive(Debug, Clone, Default)]
struct ModuleOutcome {
    outputs: Map<String, Value>,
    variables: Map<String, Value>,
    locals: Map<String, Value>,
    blocks: Vec<Block>,
    modules: Vec<ModuleCall>,
    ignores: Vec<IgnoreDirective>,
}

/// A `module` block whose source is a local directory.
struct LocalModule<'a> {
    raw: &'a RawBlock,
    name: String,
    source: String,
    directory: PathBuf,
}

impl Resolver {
    fn resolve_module(
        &mut self,
        dir: &Path,
        module_path: &[String],
        inputs: Map<String, Value>,
        parent_vars: &Map<String, Value>,
    ) -> Result<ModuleOutcome> {
        let canonical = dir.canonicalize()?;
        let key = format!(
            "{}\n{}\n{}\n{}",
            canonical.display(),
            module_path.join("."),
            serde_json::to_string(&inputs)?,
            serde_json::to_string(parent_vars)?
        );
        if let Some(done) = self.resolved.get(&key) {
            return Ok(done.clone());
        }

        if let Some(pos) = self.in_progress.iter().position(|d| *d == canonical) {
            let mut cycle: Vec<String> = self.in_progress[pos..]
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            cycle.push(canonical.display().to_string());
            return Err(ScanError::ModuleCycle {
                cycle: cycle.join(" -> "),
            });
        }

        self.in_progress.push(canonical.clone());
        let outcome = self.resolve_module_body(dir, &canonical, module_path, inputs, parent_vars);
        self.in_progress.pop();

        let outcome = outcome?;
        self.resolved.insert(key, outcome.clone());
        Ok(outcome)
    }

    fn parse(&mut self, dir: &Path, canonical: &Path) -> Result<Rc<ParsedModule>> {
        if let Some(parsed) = self.parsed.get(canonical) {
            return Ok(Rc::clone(parsed));
        }
        let parsed = Rc::new(parser::parse_directory(dir)?);
        self.parsed.insert(canonical.to_path_buf(), Rc::clone(&parsed));
        Ok(parsed)
    }

    fn resolve_module_body(
        &mut self,
        dir: &Path,
        canonical: &Path,
        module_path: &[String],
        inputs: Map<String, Value>,
        parent_vars: &Map<String, Value>,
    ) -> Result<ModuleOutcome> {
        let parsed = self.parse(dir, canonical)?;

        let mut scope = Scope::inheriting(parent_vars);

        for raw in parsed.blocks.iter().filter(|b| b.kind == "variable") {
            let Some(name) = raw.labels.first() else {
                continue;
            };
            let value = inputs.get(name).cloned().or_else(|| {
                raw.attribute("default")
                    .and_then(|attr| scope.evaluate(&attr.expr))
            });
            match value {
                Some(value) => {
                    scope.vars.insert(name.clone(), value);
                }
                None => {
                    scope.vars.remove(name);
                }
            }
        }

        let locals: Vec<&RawAttribute> = parsed
            .blocks
            .iter()
            .filter(|b| b.kind == "locals")
            .flat_map(|b| b.attributes.iter())
            .collect();
        resolve_locals(&mut scope, &locals);

        let calls = local_modules(dir, &parsed, &scope);

        // Every pass either changes the scope or settles it; a chain of
        // references needs at most one pass per declared item.
        let max_passes = locals.len() + parsed.blocks.len() + 1;
        let mut passes = 0;
        let mut outcome = loop {
            passes += 1;
            let before = scope.clone();
            let outcome = self.resolve_pass(&parsed, &locals, &calls, module_path, &mut scope)?;
            if scope == before {
                break outcome;
            }
            if passes >= max_passes {
                tracing::debug!(
                    directory = %dir.display(),
                    passes,
                    "module did not settle, keeping the last pass"
                );
                break outcome;
            }
        };

        for attr in locals.iter().filter(|a| !scope.locals.contains_key(&a.name)) {
            tracing::debug!(local = %attr.name, "local value left unknown");
        }
        tracing::debug!(directory = %dir.display(), passes, "module resolved");

        outcome.ignores.extend(parsed.ignores.iter().cloned());
        outcome.variables = scope.vars;
        outcome.locals = scope.locals;
        Ok(outcome)
    }

    /// One evaluation of every local, module call and block against the
    /// scope built so far. Resolved values are registered as they appear.
    fn resolve_pass(
        &mut self,
        parsed: &ParsedModule,
        locals: &[&RawAttribute],
        calls: &[LocalModule<'_>],
        module_path: &[String],
        scope: &mut Scope,
    ) -> Result<ModuleOutcome> {
        let mut outcome = ModuleOutcome::default();

        resolve_locals(scope, locals);
        for call in calls {
            self.resolve_call(call, module_path, scope, &mut outcome)?;
        }
        resolve_locals(scope, locals);

        for raw in &parsed.blocks {
            let instances = expand::expand(raw, module_path, scope);
            if raw.kind == "output" {
                if let (Some(name), Some(value)) = (
                    raw.labels.first(),
                    instances
                        .first()
                        .and_then(|b| b.get_attribute("value"))
                        .and_then(|a| a.value()),
                ) {
                    outcome.outputs.insert(name.clone(), value.clone());
                }
            }
            outcome.blocks.extend(instances);
        }

        Ok(outcome)
    }

    /// Resolve every instance of a local module call and expose its outputs
    /// as `module.<name>`: an object, or a list or map of objects when the
    /// call uses `count` or `for_each`.
    fn resolve_call(
        &mut self,
        call: &LocalModule<'_>,
        module_path: &[String],
        scope: &mut Scope,
        outcome: &mut ModuleOutcome,
    ) -> Result<()> {
        let repetition = expand::repetition(call.raw, scope);
        let mut outputs = Vec::new();

        for (key, bindings) in repetition.instances() {
            let frame = scope.frame(&bindings);
            let inputs: Map<String, Value> = call
                .raw
                .attributes
                .iter()
                .filter(|attr| !MODULE_META_ARGUMENTS.contains(&attr.name.as_str()))
                .filter_map(|attr| {
                    scope::evaluate(&attr.expr, &frame).map(|v| (attr.name.clone(), v))
                })
                .collect();

            let mut child_path = module_path.to_vec();
            child_path.push(match &key {
                Some(key) => format!("{}{}", call.name, key),
                None => call.name.clone(),
            });
            outcome.modules.push(ModuleCall {
                address: child_path
                    .iter()
                    .map(|m| format!("module.{}", m))
                    .collect::<Vec<_>>()
                    .join("."),
                source: call.source.clone(),
                directory: call.directory.clone(),
            });

            let child = self.resolve_module(&call.directory, &child_path, inputs, &scope.vars)?;
            outputs.push(Value::Object(child.outputs));
            outcome.blocks.extend(child.blocks);
            outcome.modules.extend(child.modules);
            outcome.ignores.extend(child.ignores);
        }

        if let Some(value) = repetition.collect(outputs) {
            scope.modules.insert(call.name.clone(), value);
        }
        Ok(())
    }
}

/// Module calls that can be followed. Remote, missing or unresolvable
/// sources are reported once and skipped.
fn local_modules<'a>(dir: &Path, parsed: &'a ParsedModule, scope: &Scope) -> Vec<LocalModule<'a>> {
    let mut calls = Vec::new();
    for raw in parsed.blocks.iter().filter(|b| b.kind == "module") {
        let Some(name) = raw.labels.first().cloned() else {
            continue;
        };
        let source = raw
            .attribute("source")
            .and_then(|attr| scope.evaluate(&attr.expr))
            .and_then(|v| v.as_str().map(str::to_owned));
        let Some(source) = source else {
            tracing::warn!(module = %name, "module has no resolvable source, skipping");
            continue;
        };
        if !is_local_source(&source) {
            tracing::warn!(module = %name, source = %source, "skipping remote module source");
            continue;
        }
        let directory = dir.join(&source);
        if !directory.is_dir() {
            tracing::warn!(
                module = %name,
                directory = %directory.display(),
                "module source directory not found, skipping"
            );
            continue;
        }
        calls.push(LocalModule {
            raw,
            name,
            source,
            directory,
        });
    }
    calls
}

/// Re-evaluate every local until a round changes nothing.
fn resolve_locals(scope: &mut Scope, locals: &[&RawAttribute]) {
    for _ in 0..=locals.len() {
        let mut changed = false;
        for attr in locals {
            if let Some(value) = scope.evaluate(&attr.expr) {
                if scope.locals.get(&attr.name) != Some(&value) {
                    scope.locals.insert(attr.name.clone(), value);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Give every block a unique address. Repeats of an address, such as a
/// second `locals` block or two unaliased providers, get an ordinal suffix.
fn disambiguate(blocks: Vec<Block>) -> Vec<Block> {
    let mut seen = HashSet::new();
    blocks
        .into_iter()
        .map(|block| {
            if seen.insert(block.full_name().to_owned()) {
                return block;
            }
            let mut n = 1;
            loop {
                let candidate = block.clone().with_ordinal(n);
                if seen.insert(candidate.full_name().to_owned()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn is_local_source(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn addresses(ctx: &Context) -> Vec<String> {
        let mut names: Vec<String> = ctx.all_blocks().map(|b| b.full_name().to_owned()).collect();
        names.sort();
        names
    }

    #[test]
    fn variables_and_locals_flow_into_attributes() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
variable "env" {
  default = "prod"
}

locals {
  name   = "${local.prefix}-${var.env}"
  prefix = "acme"
}

resource "aws_s3_bucket" "logs" {
  bucket = local.name
  policy = jsonencode({})
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        let bucket = ctx.find("aws_s3_bucket.logs").unwrap();
        assert_eq!(
            bucket.get_attribute("bucket").unwrap().value(),
            Some(&json!("acme-prod"))
        );
        let policy = bucket.get_attribute("policy").unwrap();
        assert!(!policy.is_known());
        assert_eq!(ctx.variable("env"), Some(&json!("prod")));
        assert_eq!(ctx.local("name"), Some(&json!("acme-prod")));
    }

    #[test]
    fn count_expands_to_indexed_instances() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
resource "aws_instance" "web" {
  count = 3
  tags = {
    Name = "web-${count.index}"
  }
}

resource "aws_instance" "none" {
  count = 0
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        assert_eq!(
            addresses(&ctx),
            vec!["aws_instance.web[0]", "aws_instance.web[1]", "aws_instance.web[2]"]
        );
        let second = ctx.find("aws_instance.web[1]").unwrap();
        assert_eq!(
            second.get_attribute("tags").unwrap().value(),
            Some(&json!({"Name": "web-1"}))
        );
    }

    #[test]
    fn for_each_expands_maps_and_string_lists() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
resource "aws_s3_bucket" "by_region" {
  for_each = { eu = "eu-west-1", us = "us-east-1" }
  bucket   = "logs-${each.key}"
  region   = each.value
}

resource "aws_iam_user" "people" {
  for_each = ["alice", "bob"]
  name     = each.value
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        assert_eq!(
            addresses(&ctx),
            vec![
                "aws_iam_user.people[\"alice\"]",
                "aws_iam_user.people[\"bob\"]",
                "aws_s3_bucket.by_region[\"eu\"]",
                "aws_s3_bucket.by_region[\"us\"]",
            ]
        );
        let us = ctx.find("aws_s3_bucket.by_region[\"us\"]").unwrap();
        assert_eq!(us.get_attribute("region").unwrap().as_str(), Some("us-east-1"));
        assert_eq!(us.get_attribute("bucket").unwrap().as_str(), Some("logs-us"));
    }

    #[test]
    fn unresolvable_count_keeps_one_instance() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            "resource \"aws_instance\" \"web\" {\n  count = var.nope\n}\n",
        );
        let ctx = resolve(tmp.path()).unwrap();
        assert_eq!(addresses(&ctx), vec!["aws_instance.web"]);
    }

    #[test]
    fn dynamic_blocks_expand_into_children() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
resource "aws_security_group" "web" {
  dynamic "ingress" {
    for_each = [80, 443]
    iterator = port
    content {
      from_port = port.value
    }
  }
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        let sg = ctx.find("aws_security_group.web").unwrap();
        let ingress = sg.get_blocks("ingress");
        assert_eq!(ingress.len(), 2);
        assert_eq!(
            ingress[1].get_attribute("from_port").unwrap().value(),
            Some(&json!(443))
        );
        assert_eq!(ingress[1].full_name(), "aws_security_group.web.ingress[1]");
        assert!(sg.get_block("dynamic").is_none());
    }

    #[test]
    fn later_blocks_see_earlier_resources() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
resource "aws_s3_bucket" "audit" {
  bucket = "audit-logs"
}

resource "aws_s3_bucket" "app" {
  logging {
    target_bucket = aws_s3_bucket.audit.bucket
  }
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        let app = ctx.find("aws_s3_bucket.app").unwrap();
        let logging = app.get_block("logging").unwrap();
        assert_eq!(
            logging.get_attribute("target_bucket").unwrap().as_str(),
            Some("audit-logs")
        );
    }

    #[test]
    fn modules_receive_inputs_and_expose_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
variable "region" {
  default = "eu-west-1"
}

module "storage" {
  source = "./modules/storage"
  name   = "data"
}

resource "aws_cloudtrail" "trail" {
  s3_bucket_name = module.storage.bucket_name
}
"#,
        );
        write(
            &tmp.path().join("modules/storage"),
            "main.tf",
            r#"
variable "name" {}

resource "aws_s3_bucket" "this" {
  bucket = "${var.name}-${var.region}"
}

output "bucket_name" {
  value = aws_s3_bucket.this.bucket
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        let inner = ctx.find("module.storage.aws_s3_bucket.this").unwrap();
        assert_eq!(
            inner.get_attribute("bucket").unwrap().as_str(),
            Some("data-eu-west-1")
        );
        assert_eq!(inner.module_path(), ["storage".to_owned()]);

        let trail = ctx.find("aws_cloudtrail.trail").unwrap();
        assert_eq!(
            trail.get_attribute("s3_bucket_name").unwrap().as_str(),
            Some("data-eu-west-1")
        );
        assert_eq!(ctx.modules().len(), 1);
        assert_eq!(ctx.modules()[0].address, "module.storage");
    }

    #[test]
    fn remote_modules_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            "module \"vpc\" {\n  source = \"terraform-aws-modules/vpc/aws\"\n}\n",
        );
        let ctx = resolve(tmp.path()).unwrap();
        assert!(ctx.modules().is_empty());
        assert_eq!(addresses(&ctx), vec!["module.vpc"]);
    }

    #[test]
    fn module_cycle_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("a"),
            "main.tf",
            "module \"b\" {\n  source = \"../b\"\n}\n",
        );
        write(
            &tmp.path().join("b"),
            "main.tf",
            "module \"a\" {\n  source = \"../a\"\n}\n",
        );

        let err = resolve(&tmp.path().join("a")).unwrap_err();
        match err {
            ScanError::ModuleCycle { cycle } => {
                assert!(cycle.contains("a -> "), "{cycle}");
                assert!(cycle.ends_with("a"), "{cycle}");
            }
            other => panic!("expected module cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_referencing_module_is_a_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "main.tf", "module \"me\" {\n  source = \"./\"\n}\n");
        assert!(matches!(
            resolve(tmp.path()),
            Err(ScanError::ModuleCycle { .. })
        ));
    }

    #[test]
    fn every_block_address_is_unique() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
locals {
  a = 1
}

locals {
  b = 2
}

provider "aws" {
  region = "eu-west-1"
}

provider "aws" {
  alias  = "us"
  region = "us-east-1"
}

provider "aws" {
  region = "ap-south-1"
}

resource "aws_iam_user" "u" {
  for_each = ["alice", "alice", "bob"]
  name     = each.value
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        let names = addresses(&ctx);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len(), "{names:?}");
        assert_eq!(
            names,
            vec![
                "aws_iam_user.u[\"alice\"]",
                "aws_iam_user.u[\"bob\"]",
                "locals",
                "locals[1]",
                "provider.aws",
                "provider.aws.us",
                "provider.aws[1]",
            ]
        );
    }

    #[test]
    fn references_resolve_regardless_of_file_order() {
        let bucket = "resource \"aws_s3_bucket\" \"logs\" {\n  bucket = \"audit-logs\"\n}\n";
        let trail = r#"
locals {
  target = aws_s3_bucket.logs.bucket
}

resource "aws_cloudtrail" "main" {
  s3_bucket_name = aws_s3_bucket.logs.bucket
  name           = "trail-${local.target}"
}
"#;

        for (bucket_file, trail_file) in [("a_bucket.tf", "b_trail.tf"), ("b_bucket.tf", "a_trail.tf")] {
            let tmp = tempfile::tempdir().unwrap();
            write(tmp.path(), bucket_file, bucket);
            write(tmp.path(), trail_file, trail);

            let ctx = resolve(tmp.path()).unwrap();
            let main = ctx.find("aws_cloudtrail.main").unwrap();
            assert_eq!(
                main.get_attribute("s3_bucket_name").unwrap().as_str(),
                Some("audit-logs"),
                "{trail_file}"
            );
            assert_eq!(
                main.get_attribute("name").unwrap().as_str(),
                Some("trail-audit-logs"),
                "{trail_file}"
            );
            assert_eq!(ctx.local("target"), Some(&json!("audit-logs")));
        }
    }

    #[test]
    fn outputs_see_resources_declared_later() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
module "store" {
  source = "./store"
}

resource "aws_s3_bucket_policy" "p" {
  bucket = module.store.id
}
"#,
        );
        write(
            &tmp.path().join("store"),
            "main.tf",
            "output \"id\" {\n  value = aws_s3_bucket.b.bucket\n}\n\nresource \"aws_s3_bucket\" \"b\" {\n  bucket = \"late\"\n}\n",
        );

        let ctx = resolve(tmp.path()).unwrap();
        let policy = ctx.find("aws_s3_bucket_policy.p").unwrap();
        assert_eq!(policy.get_attribute("bucket").unwrap().as_str(), Some("late"));
    }

    #[test]
    fn module_count_and_for_each_expand_per_instance() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
module "store" {
  count  = 2
  source = "./store"
  name   = "b-${count.index}"
}

module "regional" {
  for_each = { eu = "eu-west-1" }
  source   = "./store"
  name     = "r-${each.key}"
}

resource "aws_cloudtrail" "trail" {
  s3_bucket_name = module.store[1].bucket
  backup_bucket  = module.regional["eu"].bucket
}
"#,
        );
        write(
            &tmp.path().join("store"),
            "main.tf",
            r#"
variable "name" {}

resource "aws_s3_bucket" "this" {
  bucket = var.name
}

output "bucket" {
  value = aws_s3_bucket.this.bucket
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        for (address, bucket) in [
            ("module.store[0].aws_s3_bucket.this", "b-0"),
            ("module.store[1].aws_s3_bucket.this", "b-1"),
            ("module.regional[\"eu\"].aws_s3_bucket.this", "r-eu"),
        ] {
            let block = ctx.find(address).unwrap_or_else(|| panic!("{address} missing"));
            assert_eq!(block.get_attribute("bucket").unwrap().as_str(), Some(bucket));
            assert!(block.in_child_module());
        }
        assert!(ctx.find("module.store.aws_s3_bucket.this").is_none());

        let calls: Vec<&str> = ctx.modules().iter().map(|m| m.address.as_str()).collect();
        assert_eq!(
            calls,
            vec!["module.store[0]", "module.store[1]", "module.regional[\"eu\"]"]
        );

        let trail = ctx.find("aws_cloudtrail.trail").unwrap();
        assert_eq!(trail.get_attribute("s3_bucket_name").unwrap().as_str(), Some("b-1"));
        assert_eq!(trail.get_attribute("backup_bucket").unwrap().as_str(), Some("r-eu"));
    }

    #[test]
    fn oversized_or_fractional_count_keeps_one_instance() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "main.tf",
            r#"
variable "huge" {
  default = 1e12
}

resource "aws_instance" "huge" {
  count = var.huge
}

resource "aws_instance" "half" {
  count = 1.5
}

resource "aws_instance" "limit" {
  count = 10001
}
"#,
        );

        let ctx = resolve(tmp.path()).unwrap();
        assert_eq!(
            addresses(&ctx),
            vec![
                "aws_instance.half",
                "aws_instance.huge",
                "aws_instance.limit",
                "var.huge",
            ]
        );
        assert_eq!(MAX_COUNT, 10_000);
    }
}
