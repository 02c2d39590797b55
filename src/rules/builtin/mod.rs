mod aws_cloudfront;
mod aws_s3;
mod aws_security_group;
mod azure_disk;
mod gcp_disk;
mod general_secrets;

use super::{BuiltinRule, Provider, RuleMetadata, RuleRegistry, Severity};

/// Returns a registry holding every compiled-in rule.
pub fn catalog() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for rule in all_rules() {
        registry.register(Box::new(rule));
    }
    registry
}

fn all_rules() -> Vec<BuiltinRule> {
    vec![
        aws_s3::logging_rule(),
        aws_s3::encryption_rule(),
        aws_security_group::open_ingress_rule(),
        aws_security_group::description_rule(),
        aws_cloudfront::access_logging_rule(),
        azure_disk::encryption_rule(),
        gcp_disk::encryption_key_rule(),
        general_secrets::variable_default_rule(),
        general_secrets::attribute_rule(),
    ]
}

/// Metadata for a rule gated on `resource` blocks of the given types.
fn resource_rule(
    id: &str,
    provider: Provider,
    labels: &[&str],
    severity: Severity,
    description: &str,
) -> RuleMetadata {
    RuleMetadata {
        id: id.into(),
        provider,
        description: description.into(),
        required_types: vec!["resource".into()],
        required_labels: labels.iter().map(|l| l.to_string()).collect(),
        default_severity: severity,
        impact: None,
        resolution: None,
        links: vec![],
    }
}
