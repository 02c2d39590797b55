use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::rules::Severity;

/// Directory searched for config and custom checks, relative to the scan root.
pub const CONFIG_DIR: &str = ".tfsec";

const CONFIG_FILE_NAMES: &[&str] = &["config.json", "config.yml", "config.yaml", "config.toml"];

/// Scan policy: per-rule severity overrides and excluded rules.
///
/// Severity strings are normalized while deserializing, so a loaded
/// `Config` never holds `WARNING` or a lowercase token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub severity_overrides: BTreeMap<String, Severity>,
    #[serde(default, rename = "exclude")]
    pub excluded_checks: BTreeSet<String>,
}

/// Serialization families selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(ScanError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Deserialize `content` in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(&self, content: &str) -> Result<T> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        })
    }
}

impl Config {
    /// Load config from a file. The format follows the extension; any
    /// failure leaves no partial config behind.
    pub fn load(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = format.parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            overrides = config.severity_overrides.len(),
            excluded = config.excluded_checks.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Look for `.tfsec/config.{json,yml,yaml,toml}` under `root`.
    /// Returns the default config if none exists.
    pub fn discover(root: &Path) -> Result<Self> {
        match Self::find(root) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn find(root: &Path) -> Option<PathBuf> {
        let dir = root.join(CONFIG_DIR);
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Generate a starter config file.
    pub fn starter_yaml() -> &'static str {
        r#"# tfsentry configuration

# Per-rule severity overrides (CRITICAL, HIGH, MEDIUM, LOW; WARNING means MEDIUM).
severity_overrides: {}
#  AWS018: LOW

# Rule IDs to drop from the results entirely.
exclude: []
#  - GEN003
"#
    }
}
