use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

static SENSITIVE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|passwd|secret|private_key|api_key|access_key|token)").unwrap()
});

/// GEN001: sensitive-looking variable with a default value
pub fn variable_default_rule() -> BuiltinRule {
    BuiltinRule::new(
        RuleMetadata {
            id: "GEN001".into(),
            provider: Provider::General,
            description: "Potentially sensitive data stored in \"default\" value of variable."
                .into(),
            required_types: vec!["variable".into()],
            required_labels: vec![],
            default_severity: Severity::Critical,
            impact: Some("Default values could be exposing sensitive data".into()),
            resolution: Some("Don't include sensitive data in variable defaults".into()),
            links: vec![],
        },
        check_variable_default,
    )
}

/// GEN003: sensitive-looking attribute set to a string value
pub fn attribute_rule() -> BuiltinRule {
    BuiltinRule::new(
        RuleMetadata {
            id: "GEN003".into(),
            provider: Provider::General,
            description: "Potentially sensitive data stored in block attribute.".into(),
            required_types: vec!["resource".into(), "provider".into(), "data".into()],
            required_labels: vec![],
            default_severity: Severity::Critical,
            impact: Some("Block attribute could be leaking secrets".into()),
            resolution: Some("Don't include sensitive data in blocks".into()),
            links: vec![],
        },
        check_attributes,
    )
}

fn check_variable_default(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    let Some(name) = block.type_label() else {
        return Vec::new();
    };
    if !SENSITIVE_NAME_RE.is_match(name) {
        return Vec::new();
    }
    match block.get_attribute("default") {
        Some(default) if default.as_str().is_some_and(|s| !s.is_empty()) => vec![Finding::new(
            meta,
            block,
            format!(
                "Variable '{}' includes a potentially sensitive default value.",
                block.full_name()
            ),
        )
        .with_range(default.range().clone())],
        _ => Vec::new(),
    }
}

fn check_attributes(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    block
        .attributes()
        .filter(|attr| SENSITIVE_NAME_RE.is_match(attr.name()))
        .filter(|attr| attr.as_str().is_some_and(|s| !s.is_empty()))
        .map(|attr| {
            Finding::new(
                meta,
                block,
                format!(
                    "Block '{}' includes a potentially sensitive attribute '{}'.",
                    block.full_name(),
                    attr.name()
                ),
            )
            .with_range(attr.range().clone())
        })
        .collect()
}
