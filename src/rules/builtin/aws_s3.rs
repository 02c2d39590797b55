use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

/// AWS002: S3 bucket without access logging
pub fn logging_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AWS002",
        Provider::Aws,
        &["aws_s3_bucket"],
        Severity::Medium,
        "S3 Bucket does not have logging enabled.",
    );
    meta.impact = Some("There is no way to determine the access to this bucket".into());
    meta.resolution = Some("Add a logging block to the resource to enable access logging".into());
    meta.links = vec![
        "https://docs.aws.amazon.com/AmazonS3/latest/dev/ServerLogs.html".into(),
    ];
    BuiltinRule::new(meta, check_logging)
}

/// AWS017: S3 bucket without default server side encryption
pub fn encryption_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AWS017",
        Provider::Aws,
        &["aws_s3_bucket"],
        Severity::High,
        "Unencrypted S3 bucket.",
    );
    meta.impact = Some("The bucket objects could be read if compromised".into());
    meta.resolution = Some("Configure bucket encryption".into());
    meta.links = vec![
        "https://docs.aws.amazon.com/AmazonS3/latest/dev/bucket-encryption.html".into(),
    ];
    BuiltinRule::new(meta, check_encryption)
}

fn check_logging(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    if block.missing_child("logging") {
        return vec![Finding::new(
            meta,
            block,
            format!("Resource '{}' does not have logging enabled.", block.full_name()),
        )];
    }
    Vec::new()
}

fn check_encryption(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    if block.missing_child("server_side_encryption_configuration") {
        return vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' defines an unencrypted S3 bucket (missing server_side_encryption_configuration block).",
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

    fn range() -> SourceRange {
        SourceRange::new("s3.tf", 1, 12)
    }

    fn bucket() -> Block {
        Block::new("resource", vec!["aws_s3_bucket".into(), "data".into()], range())
    }

    #[test]
    fn bare_bucket_fails_both_rules() {
        let block = bucket();
        let ctx = Context::default();
        assert_eq!(logging_rule().evaluate(&block, &ctx).len(), 1);
        assert_eq!(encryption_rule().evaluate(&block, &ctx).len(), 1);
    }

    #[test]
    fn configured_bucket_passes() {
        let block = bucket()
            .with_child(Block::new("logging", vec![], range()))
            .with_child(Block::new(
                "server_side_encryption_configuration",
                vec![],
                range(),
            ));
        let ctx = Context::default();
        assert!(logging_rule().evaluate(&block, &ctx).is_empty());
        assert!(encryption_rule().evaluate(&block, &ctx).is_empty());
    }
}
