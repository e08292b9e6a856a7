//! Syntax references consumed by the binder
//!
//! The parser is not part of this crate. The binder only needs the
//! right-hand name of a member access and where it sits in the source, so
//! both member-access grammar productions collapse into one
//! [`MemberAccessContext`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Type-hint characters that may trail an identifier (`Count%`, `Name$`)
const TYPE_HINTS: &[char] = &['%', '&', '^', '!', '#', '@', '$'];

/// A source range, 1-based, end column exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Selection {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self { start_line, start_column, end_line, end_column }
    }

    /// A range on a single line
    pub fn on_line(line: u32, start_column: u32, end_column: u32) -> Self {
        Self::new(line, start_column, line, end_column)
    }

    /// The smallest range covering both
    pub fn extend(&self, other: &Selection) -> Selection {
        let start = (self.start_line, self.start_column).min((other.start_line, other.start_column));
        let end = (self.end_line, self.end_column).max((other.end_line, other.end_column));
        Selection::new(start.0, start.1, end.0, end.1)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "L{}C{}-L{}C{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Grammar production a syntax node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Production {
    /// A bare identifier (`Foo`)
    SimpleName,
    /// `lExpression.name` inside an expression
    MemberAccessExpression,
    /// `lExpression.name` inside a type or call-statement position
    MemberAccessExpr,
}

impl Production {
    pub fn as_str(&self) -> &'static str {
        match self {
            Production::SimpleName => "simple_name",
            Production::MemberAccessExpression => "member_access_expression",
            Production::MemberAccessExpr => "member_access_expr",
        }
    }

    pub fn is_member_access(&self) -> bool {
        matches!(self, Production::MemberAccessExpression | Production::MemberAccessExpr)
    }
}

/// An opaque parsed node: what production it is, the name it carries and
/// where it is. Attached to every bound expression for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub production: Production,
    /// Normalized identifier (see [`normalize_name`])
    pub name: String,
    pub selection: Selection,
}

impl SyntaxNode {
    pub fn new(production: Production, name: &str, selection: Selection) -> Result<Self> {
        let name = normalize_name(name)?;
        Ok(Self { production, name, selection })
    }

    pub fn simple_name(name: &str, selection: Selection) -> Result<Self> {
        Self::new(Production::SimpleName, name, selection)
    }
}

/// The right-hand side of a member access, whichever production it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberAccessContext(SyntaxNode);

impl MemberAccessContext {
    /// Wrap a member-access node. Simple names are rejected.
    pub fn new(node: SyntaxNode) -> Result<Self> {
        if !node.production.is_member_access() {
            return Err(Error::InvalidName(format!(
                "'{}' is a {}, not a member access",
                node.name,
                node.production.as_str()
            )));
        }
        Ok(Self(node))
    }

    /// Shorthand for an expression-position member access
    pub fn expression(name: &str, selection: Selection) -> Result<Self> {
        Self::new(SyntaxNode::new(Production::MemberAccessExpression, name, selection)?)
    }

    pub fn unrestricted_name(&self) -> &str {
        &self.0.name
    }

    pub fn selection(&self) -> Selection {
        self.0.selection
    }

    pub fn node(&self) -> &SyntaxNode {
        &self.0
    }
}

/// Normalize an unrestricted name for lookup.
///
/// Foreign identifiers lose their brackets (`[Some Name]` → `Some Name`)
/// and a trailing type hint is dropped (`Count%` → `Count`).
pub fn normalize_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let name = match trimmed.strip_prefix('[') {
        Some(rest) => rest
            .strip_suffix(']')
            .ok_or_else(|| Error::InvalidName(format!("Unterminated foreign identifier: {}", raw)))?,
        None => trimmed.strip_suffix(TYPE_HINTS).unwrap_or(trimmed),
    };
    if name.is_empty() {
        return Err(Error::InvalidName(format!("Empty identifier: '{}'", raw)));
    }
    Ok(name.to_string())
}

/// Split a dotted access chain (`Lib.[My Module].Point`) into its raw
/// segments with their positions on a single line.
pub fn split_member_access(text: &str) -> Result<Vec<(String, Selection)>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    let mut in_brackets = false;

    for (offset, ch) in text.char_indices() {
        match ch {
            '[' if !in_brackets => {
                in_brackets = true;
                current.push(ch);
            }
            ']' if in_brackets => {
                in_brackets = false;
                current.push(ch);
            }
            '.' if !in_brackets => {
                segments.push(segment(text, &current, start)?);
                current.clear();
                start = offset + 1;
            }
            _ => current.push(ch),
        }
    }
    if in_brackets {
        return Err(Error::InvalidName(format!("Unterminated foreign identifier in '{}'", text)));
    }
    segments.push(segment(text, &current, start)?);
    Ok(segments)
}

fn segment(text: &str, raw: &str, start: usize) -> Result<(String, Selection)> {
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidName(format!("Empty segment in '{}'", text)));
    }
    let column = text[..start + leading].chars().count() as u32 + 1;
    let width = trimmed.chars().count() as u32;
    Ok((trimmed.to_string(), Selection::on_line(1, column, column + width)))
}
