use serde_json::json;

use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

const SECURITY_GROUP_TYPES: &[&str] = &["aws_security_group", "aws_security_group_rule"];

/// AWS006: ingress open to the public internet
///
/// Covers standalone `aws_security_group_rule` resources with
/// `type = "ingress"` and inline `ingress` blocks of `aws_security_group`.
pub fn open_ingress_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AWS006",
        Provider::Aws,
        SECURITY_GROUP_TYPES,
        Severity::Critical,
        "An ingress security group rule allows traffic from /0.",
    );
    meta.impact = Some("Your port exposed to the internet".into());
    meta.resolution = Some("Set a more restrictive cidr range".into());
    meta.links = vec![
        "https://docs.aws.amazon.com/vpc/latest/userguide/VPC_SecurityGroups.html".into(),
    ];
    BuiltinRule::new(meta, check_open_ingress)
}

/// AWS018: security group or rule without a description
pub fn description_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AWS018",
        Provider::Aws,
        SECURITY_GROUP_TYPES,
        Severity::Low,
        "Missing description for security group/security group rule.",
    );
    meta.impact = Some("Descriptions provide context for the firewall rule reasons".into());
    meta.resolution = Some("Add descriptions for all security groups and rules".into());
    BuiltinRule::new(meta, check_description)
}

fn check_open_ingress(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    let public = json!("0.0.0.0/0");

    if block.type_label() == Some("aws_security_group_rule") {
        let is_ingress = block
            .get_attribute("type")
            .is_some_and(|t| t.equals(&json!("ingress")));
        return match block.get_attribute("cidr_blocks") {
            Some(cidrs) if is_ingress && cidrs.contains(&public) => vec![Finding::new(
                meta,
                block,
                format!(
                    "Resource '{}' defines a fully open ingress security group rule.",
                    block.full_name()
                ),
            )
            .with_range(cidrs.range().clone())],
            _ => Vec::new(),
        };
    }

    block
        .get_blocks("ingress")
        .into_iter()
        .filter_map(|ingress| {
            let cidrs = ingress.get_attribute("cidr_blocks")?;
            cidrs.contains(&public).then(|| {
                Finding::new(
                    meta,
                    block,
                    format!(
                        "Resource '{}' defines a fully open ingress security group.",
                        ingress.full_name()
                    ),
                )
                .with_range(cidrs.range().clone())
            })
        })
        .collect()
}

fn check_description(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    match block.get_attribute("description") {
        None => vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' should include a description for auditing purposes.",
                block.full_name()
            ),
        )],
        Some(attr) if attr.as_str() == Some("") => vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' should include a non-empty description for auditing purposes.",
                block.full_name()
            ),
        )
        .with_range(attr.range().clone())],
        Some(_) => Vec::new(),
    }
}
