use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

/// AZU003: managed disk with encryption explicitly disabled
pub fn encryption_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "AZU003",
        Provider::Azure,
        &["azurerm_managed_disk"],
        Severity::High,
        "Unencrypted managed disk.",
    );
    meta.impact = Some("Data could be read if compromised".into());
    meta.resolution = Some("Enable encryption on managed disks".into());
    meta.links = vec![
        "https://docs.microsoft.com/en-us/azure/virtual-machines/linux/disk-encryption".into(),
    ];
    BuiltinRule::new(meta, check)
}

fn check(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    let Some(settings) = block.get_block("encryption_settings") else {
        return Vec::new();
    };
    match settings.get_attribute("enabled") {
        Some(enabled) if enabled.is_false() => vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' defines an unencrypted managed disk.",
                block.full_name()
            ),
        )
        .with_range(enabled.range().clone())],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SourceRange;
    use crate::rules::Rule;
    use serde_json::json;

    fn disk(enabled: Option<serde_json::Value>) -> Block {
        let mut settings = Block::new("encryption_settings", vec![], SourceRange::new("d.tf", 3, 5));
        if let Some(v) = enabled {
            settings = settings.with_attribute("enabled", v);
        }
        Block::new(
            "resource",
            vec!["azurerm_managed_disk".into(), "data".into()],
            SourceRange::new("d.tf", 1, 6),
        )
        .with_child(settings)
    }

    #[test]
    fn disabled_encryption_is_flagged() {
        let findings = encryption_rule().evaluate(&disk(Some(json!(false))), &Context::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].provider, Provider::Azure);
    }

    #[test]
    fn enabled_or_unset_passes() {
        let ctx = Context::default();
        assert!(encryption_rule().evaluate(&disk(Some(json!(true))), &ctx).is_empty());
        assert!(encryption_rule().evaluate(&disk(None), &ctx).is_empty());
    }
}
