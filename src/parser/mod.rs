//! Syntax boundary: turns the `.tf` files of one module directory into raw
//! blocks with line ranges. Expressions stay unevaluated here; the resolver
//! evaluates them once variables, locals and module outputs are known.

pub mod syntax;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ir::{IgnoreDirective, SourceRange};

/// An attribute as written in source.
#[derive(Debug, Clone)]
pub struct RawAttribute {
    pub name: String,
    pub expr: ::hcl::Expression,
    /// Source text of the expression, used for bare identifiers such as
    /// a dynamic block's `iterator`.
    pub text: String,
    pub range: SourceRange,
}

/// A block as written in source.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub kind: String,
    pub labels: Vec<String>,
    pub attributes: Vec<RawAttribute>,
    pub blocks: Vec<RawBlock>,
    pub range: SourceRange,
}

impl RawBlock {
    pub fn attribute(&self, name: &str) -> Option<&RawAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn block(&self, kind: &str) -> Option<&RawBlock> {
        self.blocks.iter().find(|b| b.kind == kind)
    }
}

/// All blocks declared in one module directory.
#[derive(Debug, Clone, Default)]
pub struct ParsedModule {
    pub directory: PathBuf,
    pub blocks: Vec<RawBlock>,
    pub ignores: Vec<IgnoreDirective>,
}

/// Parse every `.tf` file directly inside `dir`, in file name order.
pub fn parse_directory(dir: &Path) -> Result<ParsedModule> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();

    let mut module = ParsedModule {
        directory: dir.to_path_buf(),
        ..Default::default()
    };

    for path in files {
        let content = std::fs::read_to_string(&path)?;
        let parsed = syntax::parse_file(&path, &content)?;
        module.blocks.extend(parsed);
        module.ignores.extend(syntax::ignore_directives(&path, &content));
    }

    tracing::debug!(
        directory = %dir.display(),
        blocks = module.blocks.len(),
        "parsed module directory"
    );

    Ok(module)
}
