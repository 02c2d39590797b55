use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

/// AWS071: CloudFront distribution without access logging
///
/// Flags `aws_cloudfront_distribution` resources with no `logging_config`
/// block. Without access logs there is no record of who requested what.
pub fn access_logging_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AWS071",
        Provider::Aws,
        &["aws_cloudfront_distribution"],
        Severity::Medium,
        "Cloudfront distribution should have Access Logging configured",
    );
    meta.impact = Some("Logging provides vital information about access and usage".into());
    meta.resolution = Some("Enable logging for CloudFront distributions".into());
    meta.links = vec![
        "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/cloudfront_distribution#logging_config".into(),
        "https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/AccessLogs.html".into(),
    ];
    BuiltinRule::new(meta, check)
}

fn check(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    if block.missing_child("logging_config") {
        return vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' does not have Access Logging configured",
                block.full_name()
            ),
        )];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SourceRange;
    use crate::rules::Rule;

    fn distribution() -> Block {
        Block::new(
            "resource",
            vec!["aws_cloudfront_distribution".into(), "cdn".into()],
            SourceRange::new("cdn.tf", 4, 20),
        )
    }

    #[test]
    fn flags_distribution_without_logging() {
        let rule = access_logging_rule();
        let block = distribution();
        let findings = rule.evaluate(&block, &Context::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "AWS071");
        assert_eq!(findings[0].address, "aws_cloudfront_distribution.cdn");
        assert_eq!(findings[0].range, SourceRange::new("cdn.tf", 4, 20));
        assert!(findings[0]
            .description
            .contains("aws_cloudfront_distribution.cdn"));
    }

    #[test]
    fn passes_distribution_with_logging() {
        let rule = access_logging_rule();
        let block = distribution().with_child(Block::new(
            "logging_config",
            vec![],
            SourceRange::new("cdn.tf", 10, 14),
        ));
        assert!(rule.evaluate(&block, &Context::default()).is_empty());
    }
}
