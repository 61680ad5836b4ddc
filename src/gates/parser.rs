//! Gate line classification.
//!
//! A gate is a list item whose first token is a checkbox:
//!
//! ```text
//! <indent>- <ws>[ ]<ws>text      unchecked gate
//! <indent>- <ws>[x]<ws>text      checked gate ([X] also accepted)
//! <indent>- <ws>[12] text        bracket reference, never a gate
//! ```
//!
//! Classification is a pure function of the line, so parsing the same text
//! twice always yields the same gates in the same order.

use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// One checklist item extracted from a task document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// Everything after the checkbox token and its following whitespace
    pub raw_text: String,
    pub checked: bool,
}

/// State of a checkbox token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkbox {
    /// `[ ]`
    Unchecked,
    /// `[x]` or `[X]`
    Checked,
}

impl Checkbox {
    #[must_use]
    pub fn is_checked(self) -> bool {
        matches!(self, Self::Checked)
    }
}

/// What a single line of a task document is, as far as gates are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// A checkbox list item.
    Gate { checkbox: Checkbox, text: &'a str },
    /// A list item starting with bracket content that is not a checkbox,
    /// such as a footnote-style `- [7] See design doc`.
    BracketReference,
    /// Anything else: prose, headings, plain list items.
    Other,
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Byte offset of the `[` that follows a list marker, if the line has the
/// shape `<ws>*-<ws>+[`.
fn bracket_offset(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start().len();
    let after_marker = line[indent..].strip_prefix('-')?;
    let body = after_marker.trim_start();
    // at least one whitespace character between `-` and the bracket
    if body.len() == after_marker.len() || !body.starts_with('[') {
        return None;
    }
    Some(line.len() - body.len())
}

/// Read an exact three-byte checkbox token from the start of `s`.
fn checkbox_token(s: &str) -> Option<Checkbox> {
    match s.as_bytes() {
        [b'[', b' ', b']', ..] => Some(Checkbox::Unchecked),
        [b'[', b'x' | b'X', b']', ..] => Some(Checkbox::Checked),
        _ => None,
    }
}

/// Classify one line of a task document.
#[must_use]
pub fn classify_line(line: &str) -> LineClass<'_> {
    let Some(offset) = bracket_offset(line) else {
        return LineClass::Other;
    };
    let bracketed = &line[offset..];
    match checkbox_token(bracketed) {
        // the token is three ASCII bytes, so slicing at 3 is a char boundary
        Some(checkbox) => LineClass::Gate {
            checkbox,
            text: bracketed[3..].trim_start(),
        },
        None => LineClass::BracketReference,
    }
}

/// Extract all gates from `text` in document order.
#[must_use]
pub fn parse_gates(text: &str) -> Vec<Gate> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| match classify_line(line) {
            LineClass::Gate { checkbox, text } => Some(Gate {
                line_number: idx + 1,
                raw_text: text.to_string(),
                checked: checkbox.is_checked(),
            }),
            LineClass::BracketReference | LineClass::Other => None,
        })
        .collect()
}

/// Rewrite an unchecked gate line as checked, preserving indentation and
/// text. Returns `None` when the line is not an unchecked gate.
#[must_use]
pub fn check_line(line: &str) -> Option<String> {
    let offset = bracket_offset(line)?;
    match checkbox_token(&line[offset..])? {
        Checkbox::Unchecked => Some(format!("{}[x]{}", &line[..offset], &line[offset + 3..])),
        Checkbox::Checked => None,
    }
}
