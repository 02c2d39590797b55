//! Resolved configuration model shared by the resolver, the rules and the scanner.
//!
//! The resolver produces a `Context`. Every rule, built-in or custom, reads
//! blocks and attributes only through the types in this module, so rule code
//! never sees raw HCL syntax.

pub mod block;
pub mod context;
pub mod value;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use block::{Attribute, Block, InstanceKey};
pub use context::{Context, IgnoreDirective, ModuleCall};

/// Attribute values are JSON-shaped once resolved.
pub type Value = serde_json::Value;

/// Location of a block or attribute in source.
///
/// Field order matters: the derived `Ord` sorts by file, then start line,
/// then end line, which is the order findings are reported in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceRange {
    pub fn new(file: impl Into<PathBuf>, start_line: usize, end_line: usize) -> Self {
        Self {
            file: file.into(),
            start_line,
            end_line,
        }
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file.display(), self.start_line)
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.file.display(),
                self.start_line,
                self.end_line
            )
        }
    }
}
