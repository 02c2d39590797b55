use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{Result, ScanError};
use crate::ir::{Block, SourceRange};

/// A security finding produced by a rule against one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier (e.g., "AWS071").
    pub rule_id: String,
    pub provider: Provider,
    /// Address of the offending block (e.g., "aws_s3_bucket.logs[0]").
    pub address: String,
    pub severity: Severity,
    /// Human-readable description of the finding.
    pub description: String,
    pub range: SourceRange,
    pub impact: Option<String>,
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

/// Identity used by the result set to collapse duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindingKey {
    pub rule_id: String,
    pub address: String,
    pub range: SourceRange,
    pub description: String,
}

impl Finding {
    /// A finding against `block`, located at the block's own range.
    pub fn new(rule: &RuleMetadata, block: &Block, description: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            provider: rule.provider,
            address: block.full_name().to_owned(),
            severity: rule.default_severity,
            description: description.into(),
            range: block.range().clone(),
            impact: rule.impact.clone(),
            resolution: rule.resolution.clone(),
            links: rule.links.clone(),
        }
    }

    /// Point the finding at a narrower range, e.g. one attribute.
    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    pub fn key(&self) -> FindingKey {
        FindingKey {
            rule_id: self.rule_id.clone(),
            address: self.address.clone(),
            range: self.range.clone(),
            description: self.description.clone(),
        }
    }

    /// Stable hex digest of rule, address and range; survives severity
    /// overrides and description rewording.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::new()
            .chain_update(self.rule_id.as_bytes())
            .chain_update([0u8])
            .chain_update(self.address.as_bytes())
            .chain_update([0u8])
            .chain_update(self.range.file.to_string_lossy().as_bytes())
            .chain_update(self.range.start_line.to_le_bytes())
            .chain_update(self.range.end_line.to_le_bytes())
            .finalize();
        hex::encode(digest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity token, case-insensitively.
    ///
    /// `WARNING` is the historical name for MEDIUM. `ERROR` and `INFO` come
    /// from older custom check files and map to HIGH and LOW.
    pub fn normalize(token: &str) -> Result<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Self::Critical),
            "HIGH" | "ERROR" => Ok(Self::High),
            "MEDIUM" | "WARNING" => Ok(Self::Medium),
            "LOW" | "INFO" => Ok(Self::Low),
            _ => Err(ScanError::Severity(token.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::normalize(s)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::normalize(&token).map_err(serde::de::Error::custom)
    }
}

/// Cloud provider a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
    General,
    Custom,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aws => write!(f, "aws"),
            Self::Azure => write!(f, "azure"),
            Self::Gcp => write!(f, "gcp"),
            Self::General => write!(f, "general"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Identity, gate and documentation of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    pub provider: Provider,
    pub description: String,
    /// Block kinds the rule runs on (e.g., "resource").
    pub required_types: Vec<String>,
    /// Accepted first labels; empty accepts any.
    pub required_labels: Vec<String>,
    pub default_severity: Severity,
    pub impact: Option<String>,
    pub resolution: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl RuleMetadata {
    /// Exact gate: kind must be listed, and the first label too unless the
    /// label list is empty.
    pub fn applies_to(&self, block: &Block) -> bool {
        if !self.required_types.iter().any(|t| t == block.kind()) {
            return false;
        }
        self.required_labels.is_empty()
            || block
                .type_label()
                .is_some_and(|label| self.required_labels.iter().any(|l| l == label))
    }
}
