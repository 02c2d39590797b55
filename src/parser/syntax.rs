use std::ops::Range;
use std::path::Path;

use hcl_edit::structure::{Block, BlockLabel, Structure};
use hcl_edit::Span;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RawAttribute, RawBlock};
use crate::error::{Result, ScanError};
use crate::ir::{IgnoreDirective, SourceRange};

static IGNORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tfsec:ignore:([A-Za-z0-9_\-]+|\*)").unwrap());

/// Byte offset to 1-based line lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    fn range(&self, file: &Path, span: Option<Range<usize>>) -> SourceRange {
        match span {
            Some(span) => {
                let last = span.end.saturating_sub(1).max(span.start);
                SourceRange::new(file, self.line_of(span.start), self.line_of(last))
            }
            None => SourceRange::new(file, 1, 1),
        }
    }
}

/// Parse one file's top-level blocks. Top-level attributes are not valid
/// Terraform and are skipped.
pub fn parse_file(path: &Path, content: &str) -> Result<Vec<RawBlock>> {
    let body = hcl_edit::parser::parse_body(content).map_err(|e| ScanError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    let lines = LineIndex::new(content);

    Ok(body
        .iter()
        .filter_map(|structure| match structure {
            Structure::Block(block) => Some(convert_block(block, path, content, &lines)),
            Structure::Attribute(_) => None,
        })
        .collect())
}

fn convert_block(block: &Block, path: &Path, content: &str, lines: &LineIndex) -> RawBlock {
    let mut raw = RawBlock {
        kind: block.ident.as_str().to_owned(),
        labels: block.labels.iter().map(label_text).collect(),
        attributes: Vec::new(),
        blocks: Vec::new(),
        range: lines.range(path, block.span()),
    };

    for structure in block.body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let text = attr
                    .value
                    .span()
                    .and_then(|span| content.get(span))
                    .map(|s| s.trim().to_owned())
                    .unwrap_or_default();
                raw.attributes.push(RawAttribute {
                    name: attr.key.as_str().to_owned(),
                    expr: ::hcl::Expression::from(attr.value.clone()),
                    text,
                    range: lines.range(path, attr.span()),
                });
            }
            Structure::Block(inner) => raw.blocks.push(convert_block(inner, path, content, lines)),
        }
    }

    raw
}

fn label_text(label: &BlockLabel) -> String {
    match label {
        BlockLabel::Ident(ident) => ident.as_str().to_owned(),
        BlockLabel::String(s) => s.as_str().to_owned(),
    }
}

/// Collect `tfsec:ignore:<RULE>` directives from comments.
pub fn ignore_directives(path: &Path, content: &str) -> Vec<IgnoreDirective> {
    content
        .lines()
        .enumerate()
        .flat_map(|(idx, line)| {
            let comment = match (line.find('#'), line.find("//")) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            comment
                .map(|start| {
                    IGNORE_RE
                        .captures_iter(&line[start..])
                        .map(|caps| IgnoreDirective {
                            file: path.to_path_buf(),
                            line: idx + 1,
                            rule_id: caps[1].to_owned(),
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
        .collect()
}
