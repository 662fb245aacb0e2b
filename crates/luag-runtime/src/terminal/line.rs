//! The line being edited.

use super::display::{COLOR_ERROR, COLOR_INPUT, COLOR_NORMAL};

/// Maximum number of characters in an [`ActiveLine`].
pub const MAX_LINE_LEN: usize = 127;

/// How a line is coloured, and whether closing it dispatches a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineKind {
    #[default]
    Normal,
    Error,
    /// Typed by the user. Closing an input line dispatches it.
    Input,
}

impl LineKind {
    /// RGB colour the line is drawn in.
    #[must_use]
    pub fn color(self) -> u32 {
        match self {
            Self::Normal => COLOR_NORMAL,
            Self::Error => COLOR_ERROR,
            Self::Input => COLOR_INPUT,
        }
    }
}

/// Printable ASCII accepted into a line.
#[must_use]
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// The terminal's open line: at most [`MAX_LINE_LEN`] printable ASCII
/// characters and a cursor in `0..=len`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLine {
    text: String,
    cursor: usize,
    pub(crate) kind: LineKind,
}

impl ActiveLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Inserts a printable character at the cursor.
    ///
    /// Returns `false` (and leaves the line untouched) when the line is full
    /// or the byte is not printable ASCII.
    pub fn insert(&mut self, byte: u8) -> bool {
        if !is_printable(byte) || self.text.len() >= MAX_LINE_LEN {
            return false;
        }
        self.text.insert(self.cursor, char::from(byte));
        self.cursor += 1;
        true
    }

    /// Deletes the character left of the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.text.remove(self.cursor);
    }

    /// Deletes the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor += 1;
        }
    }

    /// Empties the text and homes the cursor. The kind is kept.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Replaces the text, cursor at the end.
    ///
    /// Non-printable characters are dropped and the result is truncated to
    /// [`MAX_LINE_LEN`].
    pub fn replace(&mut self, text: &str) {
        self.text = text
            .bytes()
            .filter(|b| is_printable(*b))
            .take(MAX_LINE_LEN)
            .map(char::from)
            .collect();
        self.cursor = self.text.len();
    }
}
