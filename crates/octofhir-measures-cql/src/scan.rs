//! Scanner for `define` statements in CQL text
//!
//! Only statement heads are recognised: `define [public|private] [fluent]
//! [function] Name`, with `Name` either a plain or a double-quoted
//! identifier. Comments are masked before scanning so commented-out
//! definitions are not reported; string literals (which often carry `//`
//! inside URLs) are blanked as a unit so their contents never match.

use indexmap::IndexSet;
use octofhir_measures_diagnostics::{SourceLocation, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DEFINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*define[ \t]+(?:(?:public|private)[ \t]+)?(?:fluent[ \t]+)?(function[ \t]+)?(?:"((?:[^"\\\n]|\\.)+)"|([A-Za-z_][A-Za-z0-9_]*))"#,
    )
    .expect("define pattern is valid")
});

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Kind of a `define` statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Expression,
    Function,
}

/// A `define` statement found in CQL text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Defined name, without quotes
    pub name: String,
    pub kind: DefinitionKind,
    /// Span of the name in the scanned text
    pub span: Span,
    /// Location of the name in the scanned text
    pub location: SourceLocation,
}

/// Find all `define` statements in `text`, in source order
pub fn scan_definitions(text: &str) -> Vec<Definition> {
    let masked = mask_non_code(text);

    DEFINE_RE
        .captures_iter(&masked)
        .filter_map(|caps| {
            let kind = if caps.get(1).is_some() {
                DefinitionKind::Function
            } else {
                DefinitionKind::Expression
            };
            let name = caps.get(2).or_else(|| caps.get(3))?;
            let span = Span::new(name.start(), name.end());
            Some(Definition {
                name: name.as_str().to_string(),
                kind,
                span,
                location: SourceLocation::from_span(span, text),
            })
        })
        .collect()
}

/// Names defined in `text`, deduplicated, in first-definition order
pub fn defined_names(text: &str) -> IndexSet<String> {
    scan_definitions(text).into_iter().map(|d| d.name).collect()
}

/// The identifier an expression consists of, if it is a single plain or quoted identifier
pub fn referenced_identifier(expression: &str) -> Option<&str> {
    let expr = expression.trim();
    if IDENTIFIER_RE.is_match(expr) {
        return Some(expr);
    }
    let inner = expr.strip_prefix('"')?.strip_suffix('"')?;
    if inner.is_empty() || inner.contains('"') {
        None
    } else {
        Some(inner)
    }
}

/// Whether an expression is a single plain or quoted identifier
pub fn is_simple_identifier(expression: &str) -> bool {
    referenced_identifier(expression).is_some()
}

#[derive(Clone, Copy, PartialEq)]
enum MaskState {
    Code,
    LineComment,
    BlockComment,
    Quoted(u8),
}

/// Blank out comments and string literal contents, keeping newlines and byte offsets intact
pub(crate) fn mask_non_code(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = MaskState::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            MaskState::Code => match (b, next) {
                (b'/', Some(b'/')) => {
                    state = MaskState::LineComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = MaskState::BlockComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'\'' | b'"' | b'`', _) => {
                    state = MaskState::Quoted(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            MaskState::LineComment => {
                if b == b'\n' {
                    state = MaskState::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
            MaskState::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = MaskState::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { b' ' });
            }
            MaskState::Quoted(quote) => {
                // string literal contents are blanked, quoted identifiers kept
                let keep = |byte: u8| {
                    if quote != b'\'' || byte == b'\n' { byte } else { b' ' }
                };
                if b == b'\\' {
                    if let Some(escaped) = next {
                        out.push(keep(b));
                        out.push(keep(escaped));
                        i += 2;
                        continue;
                    }
                    out.push(keep(b));
                } else if b == quote {
                    state = MaskState::Code;
                    out.push(b);
                } else {
                    out.push(keep(b));
                }
            }
        }
        i += 1;
    }

    // Only whole comment and string runs are replaced, all of them by ASCII
    String::from_utf8_lossy(&out).into_owned()
}
