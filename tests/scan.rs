use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use tfsentry::config::Config;
use tfsentry::error::ScanError;
use tfsentry::output::OutputFormat;
use tfsentry::rules::Severity;
use tfsentry::{render_report, resolver, scan, ScanOptions};

fn module(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn rule_ids(report: &tfsentry::ScanReport) -> Vec<&str> {
    report.findings.iter().map(|f| f.rule_id.as_str()).collect()
}

#[test]
fn cloudfront_logging_rule_hits_only_the_distribution_without_logging() {
    let report = scan(Path::new("tests/fixtures/cloudfront"), &ScanOptions::default()).unwrap();

    assert_eq!(rule_ids(&report), vec!["AWS071"]);
    let finding = &report.findings[0];
    assert_eq!(finding.address, "aws_cloudfront_distribution.bad");
    assert_eq!(finding.range.start_line, 1);
    assert_eq!(finding.range.end_line, 3);
    assert!(finding.range.file.ends_with("main.tf"));
}

#[test]
fn custom_tag_check_flags_non_production_instances() {
    let report = scan(Path::new("tests/fixtures/tagged"), &ScanOptions::default()).unwrap();

    let custom: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "CUS001")
        .collect();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].address, "aws_instance.test");
    assert_eq!(custom[0].description, "The required Environment tag was missing");
    // .tfsec/config.yml overrides the check's ERROR severity with WARNING.
    assert_eq!(custom[0].severity, Severity::Medium);
}

#[test]
fn modules_and_count_produce_distinct_addresses() {
    let root = Path::new("tests/fixtures/modules");
    let ctx = resolver::resolve(root).unwrap();

    let first = ctx.find("module.storage.aws_s3_bucket.this[0]").unwrap();
    let second = ctx.find("module.storage.aws_s3_bucket.this[1]").unwrap();
    assert_eq!(first.get_attribute("bucket").unwrap().as_str(), Some("acme-data-0"));
    assert_eq!(second.get_attribute("bucket").unwrap().as_str(), Some("acme-data-1"));
    assert_eq!(ctx.modules().len(), 1);
    assert_eq!(ctx.modules()[0].address, "module.storage");

    let output = ctx.find("output.first_bucket").unwrap();
    assert_eq!(output.get_attribute("value").unwrap().as_str(), Some("acme-data-0"));

    let report = scan(root, &ScanOptions::default()).unwrap();
    let mut hits: Vec<(String, String)> = report
        .findings
        .iter()
        .map(|f| (f.rule_id.clone(), f.address.clone()))
        .collect();
    hits.sort();
    assert_eq!(
        hits,
        vec![
            ("AWS002".to_string(), "module.storage.aws_s3_bucket.this[0]".to_string()),
            ("AWS002".to_string(), "module.storage.aws_s3_bucket.this[1]".to_string()),
            ("AWS017".to_string(), "module.storage.aws_s3_bucket.this[0]".to_string()),
            ("AWS017".to_string(), "module.storage.aws_s3_bucket.this[1]".to_string()),
        ]
    );
}

#[test]
fn module_cycle_aborts_the_scan() {
    let err = scan(Path::new("tests/fixtures/cycle/a"), &ScanOptions::default()).unwrap_err();
    match err {
        ScanError::ModuleCycle { cycle } => {
            assert!(cycle.contains("cycle/a"), "{cycle}");
            assert!(cycle.contains("cycle/b"), "{cycle}");
        }
        other => panic!("expected a module cycle, got {other}"),
    }
}

#[test]
fn config_files_in_every_format_parse_identically() {
    let dir = Path::new("tests/fixtures/configs");
    let expected = Config::load(&dir.join("config.yaml")).unwrap();
    for name in ["config.yml", "config.json", "config.toml"] {
        assert_eq!(Config::load(&dir.join(name)).unwrap(), expected, "{name}");
    }
    assert_eq!(expected.severity_overrides["AWS018"], Severity::Low);
    assert!(expected.excluded_checks.contains("DP001"));
}

#[test]
fn excluded_rules_never_reach_the_report() {
    let dir = module(&[
        (
            "main.tf",
            r#"
resource "aws_s3_bucket" "data" {
  bucket = "data"
}
"#,
        ),
        (
            "policy.yml",
            "exclude:\n  - AWS002\nseverity_overrides:\n  AWS002: CRITICAL\n  AWS017: low\n",
        ),
    ]);
    let options = ScanOptions {
        config_path: Some(dir.path().join("policy.yml")),
        ..Default::default()
    };
    let report = scan(dir.path(), &options).unwrap();

    assert_eq!(rule_ids(&report), vec!["AWS017"]);
    assert_eq!(report.findings[0].severity, Severity::Low);
    assert_eq!(report.stats.excluded, 1);
}

#[test]
fn inline_ignore_comments_suppress_findings() {
    let source = r#"
# tfsec:ignore:AWS002
resource "aws_s3_bucket" "quiet" {
  bucket = "quiet"
}

resource "aws_s3_bucket" "loud" { # tfsec:ignore:*
  bucket = "loud"
}
"#;
    let dir = module(&[("main.tf", source)]);

    let report = scan(dir.path(), &ScanOptions::default()).unwrap();
    let hits: Vec<(&str, &str)> = report
        .findings
        .iter()
        .map(|f| (f.rule_id.as_str(), f.address.as_str()))
        .collect();
    assert_eq!(hits, vec![("AWS017", "aws_s3_bucket.quiet")]);
    assert_eq!(report.stats.ignored, 3);

    let options = ScanOptions {
        include_ignored: true,
        ..Default::default()
    };
    assert_eq!(scan(dir.path(), &options).unwrap().findings.len(), 4);
}

#[test]
fn invalid_custom_check_file_fails_the_scan() {
    let dir = module(&[
        ("main.tf", "resource \"aws_instance\" \"web\" {\n  ami = \"x\"\n}\n"),
        (
            ".tfsec/bad_tfchecks.yaml",
            "checks:\n  - code: CUS1\n    requiredTypes: [resource]\n    matchSpec:\n      name: ami\n      action: isShiny\n",
        ),
    ]);
    let err = scan(dir.path(), &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, ScanError::CustomCheck { ref code, .. } if code == "CUS1"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn custom_check_cannot_shadow_a_builtin() {
    let dir = module(&[
        ("main.tf", ""),
        (
            "checks/dupe_tfchecks.json",
            r#"{"checks": [{"code": "AWS071", "requiredTypes": ["resource"], "matchSpec": {"name": "x", "action": "isPresent"}}]}"#,
        ),
    ]);
    let options = ScanOptions {
        custom_checks_dir: Some(dir.path().join("checks")),
        ..Default::default()
    };
    assert!(matches!(
        scan(dir.path(), &options),
        Err(ScanError::CustomCheck { .. })
    ));
}

#[test]
fn unsupported_config_extension_is_an_error() {
    let dir = module(&[("main.tf", ""), ("config.ini", "[x]\n")]);
    let options = ScanOptions {
        config_path: Some(dir.path().join("config.ini")),
        ..Default::default()
    };
    assert!(matches!(
        scan(dir.path(), &options),
        Err(ScanError::UnsupportedFormat(_))
    ));
}

#[test]
fn for_each_and_dynamic_blocks_are_checked_per_instance() {
    let source = r#"
variable "ports" {
  default = [22, 443]
}

resource "aws_security_group" "web" {
  for_each    = { a = "10.0.1.0/24", b = "10.0.2.0/24" }
  description = "web ${each.key}"

  dynamic "ingress" {
    for_each = var.ports
    content {
      from_port   = ingress.value
      to_port     = ingress.value
      cidr_blocks = ["0.0.0.0/0"]
    }
  }
}
"#;
    let dir = module(&[("main.tf", source)]);
    let report = scan(dir.path(), &ScanOptions::default()).unwrap();

    let open: Vec<&str> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "AWS006")
        .map(|f| f.address.as_str())
        .collect();
    assert_eq!(
        open,
        vec![
            "aws_security_group.web[\"a\"]",
            "aws_security_group.web[\"a\"]",
            "aws_security_group.web[\"b\"]",
            "aws_security_group.web[\"b\"]",
        ]
    );
}

#[test]
fn cancelled_scan_reports_cancellation() {
    let options = ScanOptions {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        ..Default::default()
    };
    assert!(matches!(
        scan(Path::new("tests/fixtures/cloudfront"), &options),
        Err(ScanError::Cancelled)
    ));
}

#[test]
fn reports_render_in_every_format() {
    let report = scan(Path::new("tests/fixtures/cloudfront"), &ScanOptions::default()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&render_report(&report, OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["results"][0]["rule_id"], "AWS071");

    let sarif: serde_json::Value =
        serde_json::from_str(&render_report(&report, OutputFormat::Sarif).unwrap()).unwrap();
    assert_eq!(sarif["runs"][0]["results"][0]["ruleId"], "AWS071");

    let console = render_report(&report, OutputFormat::Console).unwrap();
    assert!(console.contains("AWS071"));
}
