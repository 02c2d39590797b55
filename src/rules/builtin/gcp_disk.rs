use crate::ir::{Block, Context};
use crate::rules::{BuiltinRule, Finding, Provider, RuleMetadata, Severity};

/// GCP001: compute disk without a customer-supplied encryption key
pub fn encryption_key_rule() -> BuiltinRule {
    let mut meta = super::resource_rule(
        "GCP001",
        Provider::Gcp,
        &["google_compute_disk"],
        Severity::Low,
        "Encrypted compute disk with unmanaged keys.",
    );
    meta.impact = Some("Encryption of disk using unmanaged keys".into());
    meta.resolution = Some("Enable encryption using a customer managed key".into());
    meta.links = vec![
        "https://cloud.google.com/compute/docs/disks/customer-supplied-encryption".into(),
    ];
    BuiltinRule::new(meta, check)
}

fn check(meta: &RuleMetadata, block: &Block, _: &Context) -> Vec<Finding> {
    if block.missing_child("disk_encryption_key") {
        return vec![Finding::new(
            meta,
            block,
            format!(
                "Resource '{}' defines an unencrypted disk. You should specify a disk_encryption_key.",
                block.full_name()
            ),
        )];
    }
    Vec::new()
}
