use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported document format for {0} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("Unrecognized severity '{0}' (expected CRITICAL, HIGH, MEDIUM, LOW or WARNING)")]
    Severity(String),

    #[error("Custom check error in {file} ({code}): {message}")]
    CustomCheck {
        file: String,
        code: String,
        message: String,
    },

    #[error("Module cycle detected: {cycle}")]
    ModuleCycle { cycle: String },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
