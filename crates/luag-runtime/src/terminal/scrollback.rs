//! Closed rows.

use super::line::LineKind;

/// Immutable fixed-width fragment of a closed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    text: String,
    kind: LineKind,
}

impl Row {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    #[must_use]
    pub fn color(&self) -> u32 {
        self.kind.color()
    }
}

/// Hard-wraps `text` into rows of at most `width` characters.
///
/// Always yields at least one row, so an empty line still occupies one.
#[must_use]
pub fn wrap(text: &str, kind: LineKind, width: usize) -> Vec<Row> {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![Row {
            text: String::new(),
            kind,
        }];
    }
    chars
        .chunks(width)
        .map(|chunk| Row {
            text: chunk.iter().collect(),
            kind,
        })
        .collect()
}
