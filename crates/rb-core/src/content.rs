//! # Content Parser
//!
//! Classifies each line of a post body as plain text, greentext, or a
//! reference to another post. Lines are classified independently.
//!
//! A line is a reference when it is `>` followed by one of:
//! - `>` and a run of digits (`>>123`)
//! - a run of digits (`>123`)
//! - a single space and a run of digits (`> 123`)
//!
//! Any other line starting with `>` is greentext. Parsing never fails: a
//! malformed reference (such as a lone `>` or an id too large for [`PostId`])
//! is classified as greentext.

use serde::{Deserialize, Serialize};

use crate::models::PostId;

const QUOTE: char = '>';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Plain,
    Greentext,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub text: String,
    pub kind: LineKind,
    /// Set only for [`LineKind::Reference`]
    pub reference: Option<PostId>,
}

impl ClassifiedLine {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: LineKind::Plain,
            reference: None,
        }
    }

    fn greentext(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: LineKind::Greentext,
            reference: None,
        }
    }

    fn reference(text: &str, id: PostId) -> Self {
        Self {
            text: text.to_string(),
            kind: LineKind::Reference,
            reference: Some(id),
        }
    }
}

/// Classifies every line, one record per input line, in input order.
pub fn parse_content<I, S>(lines: I) -> Vec<ClassifiedLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| classify_line(line.as_ref()))
        .collect()
}

/// Splits a raw post body on line boundaries and classifies it.
pub fn parse_body(body: &str) -> Vec<ClassifiedLine> {
    parse_content(body.lines())
}

pub fn classify_line(line: &str) -> ClassifiedLine {
    let Some(rest) = line.strip_prefix(QUOTE) else {
        return ClassifiedLine::plain(line);
    };

    let digits = rest
        .strip_prefix(QUOTE)
        .or_else(|| rest.strip_prefix(' '))
        .unwrap_or(rest);

    match parse_post_id(digits) {
        Some(id) => ClassifiedLine::reference(line, id),
        None => ClassifiedLine::greentext(line),
    }
}

/// Accepts a non-empty run of ASCII digits only (no sign, no whitespace).
fn parse_post_id(digits: &str) -> Option<PostId> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
