//! Tag grammar.
//!
//! An annotation is a comma separated list of entries; each entry is `name`,
//! `name=value` or `name=v1 v2 ...` / `name='v 1' 'v 2'` depending on the
//! operation's arity.
use std::fmt;

use crate::error::ParseError;
use crate::ir::Validation;
use crate::registry::{Arity, Registry};

/// Parse a single annotation entry.
pub fn parse_validation(entry: &str, registry: &Registry) -> Result<Validation, ParseError> {
    let mut parts = entry.split('=');
    let name = parts.next().unwrap_or_default().trim();
    let target = parts.next().unwrap_or_default().trim();
    if parts.next().is_some() {
        return Err(ParseError::Malformed { entry: entry.to_string() });
    }

    let op = registry
        .lookup(name)
        .ok_or_else(|| ParseError::Unsupported { name: name.to_string() })?;
    let op_name = op.kind.name().to_string();

    let values = match op.arity {
        Arity::Zero => {
            if !target.is_empty() {
                return Err(ParseError::ExpectedZeroTarget { op: op_name, found: target.to_string() });
            }
            Vec::new()
        }
        Arity::One => {
            if target.is_empty() {
                return Err(ParseError::ExpectedOneTarget { op: op_name });
            }
            vec![target.to_string()]
        }
        Arity::Many => {
            let values = if target.contains('\'') {
                parse_quoted(&op_name, target)?
            } else {
                target
                    .split(|c: char| c == ' ' || c == ',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            };
            if values.is_empty() {
                return Err(ParseError::ExpectedManyTargets { op: op_name, count: 0 });
            }
            values
        }
    };

    Ok(Validation { op: op.kind, arity: op.arity, values })
}

/// `'a' 'b c'` → `["a", "b c"]`
fn parse_quoted(op: &str, target: &str) -> Result<Vec<String>, ParseError> {
    let mut out = Vec::new();
    let mut rest = target;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(out);
        }
        let Some(body) = rest.strip_prefix('\'') else {
            return Err(ParseError::InvalidQuote { op: op.to_string(), value: target.to_string() });
        };
        let Some(end) = body.find('\'') else {
            return Err(ParseError::UnterminatedQuote { op: op.to_string(), value: target.to_string() });
        };
        out.push(body[..end].to_string());
        rest = &body[end + 1..];
    }
}

/// Split a whole annotation into entries on commas that sit outside single quotes.
/// Blank entries are dropped.
///
/// A `'` opens a quote only where a value can start (after `=`, whitespace, a comma or a
/// closing quote), so apostrophes inside a word like `O'Brien` stay literal.
pub fn split_entries(tag: &str) -> Result<Vec<&str>, ParseError> {
    let mut out = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    let mut prev = None;
    for (i, c) in tag.char_indices() {
        match c {
            '\'' if quoted => quoted = false,
            '\'' if matches!(prev, None | Some('=' | ',' | '\'')) || prev.is_some_and(char::is_whitespace) => {
                quoted = true;
            }
            ',' if !quoted => {
                out.push(&tag[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        prev = Some(c);
    }
    if quoted {
        return Err(ParseError::UnbalancedQuote { tag: tag.to_string() });
    }
    out.push(&tag[start..]);
    Ok(out.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect())
}

/// Canonical entry text; parses back to an equal `Validation`.
impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arity {
            Arity::Zero => write!(f, "{}", self.op),
            Arity::One => write!(f, "{}={}", self.op, self.values.join("")),
            Arity::Many => {
                let quoted = self.values.iter().map(|v| format!("'{v}'")).collect::<Vec<_>>();
                write!(f, "{}={}", self.op, quoted.join(" "))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
