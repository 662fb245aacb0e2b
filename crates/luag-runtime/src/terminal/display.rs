//! Rendering and clipboard collaborators.
//!
//! The terminal draws in character cells; turning cells into pixels, fonts
//! and windows is the implementor's business.

/// Background colour.
pub const COLOR_BACKGROUND: u32 = 0x000000;
/// Colour of ordinary output.
pub const COLOR_NORMAL: u32 = 0xffffff;
/// Colour of error output.
pub const COLOR_ERROR: u32 = 0xff0000;
/// Colour of user input.
pub const COLOR_INPUT: u32 = 0x00ff00;
/// Colour of the blinking cursor.
pub const COLOR_CURSOR: u32 = 0xff0000;
/// Glyph drawn for the cursor.
pub const CURSOR_GLYPH: &str = "_";

/// Character-cell display.
pub trait Display {
    /// Fills the whole screen.
    fn clear(&mut self, color: u32);

    /// Draws `text` starting at cell `(column, row)`. Text past the right
    /// edge is clipped by the implementor.
    fn draw_text(&mut self, text: &str, color: u32, column: usize, row: usize);
}

/// System clipboard.
pub trait Clipboard {
    /// Current clipboard text, `None` if empty or unavailable.
    fn get_text(&mut self) -> Option<String>;

    fn set_text(&mut self, text: &str);
}

/// Process-local clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    content: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.content.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.content = Some(text.to_string());
    }
}

/// In-memory character grid.
///
/// Each cell holds a glyph and its colour. Useful to snapshot what a
/// [`Display`] would show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextGrid {
    columns: usize,
    cells: Vec<Vec<(char, u32)>>,
}

impl TextGrid {
    #[must_use]
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            cells: vec![vec![(' ', COLOR_BACKGROUND); columns]; rows],
        }
    }

    /// Row `row` as text, trailing blanks trimmed.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        self.cells
            .get(row)
            .map(|cells| cells.iter().map(|(c, _)| *c).collect::<String>())
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    }

    /// Glyph and colour at `(column, row)`.
    #[must_use]
    pub fn cell(&self, column: usize, row: usize) -> Option<(char, u32)> {
        self.cells.get(row)?.get(column).copied()
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl Display for TextGrid {
    fn clear(&mut self, color: u32) {
        for row in &mut self.cells {
            row.fill((' ', color));
        }
    }

    fn draw_text(&mut self, text: &str, color: u32, column: usize, row: usize) {
        let Some(cells) = self.cells.get_mut(row) else {
            return;
        };
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = cells.get_mut(column + offset) {
                *cell = (ch, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_roundtrip() {
        let mut clip = MemoryClipboard::default();
        assert_eq!(clip.get_text(), None);
        clip.set_text("run");
        assert_eq!(clip.get_text().as_deref(), Some("run"));
    }

    #[test]
    fn grid_clips_at_edges() {
        let mut grid = TextGrid::new(4, 2);
        grid.draw_text("abcdef", COLOR_NORMAL, 1, 0);
        grid.draw_text("zz", COLOR_ERROR, 0, 5);
        assert_eq!(grid.row_text(0), " abc");
        assert_eq!(grid.cell(1, 0), Some(('a', COLOR_NORMAL)));
        assert_eq!(grid.row_text(1), "");
    }

    #[test]
    fn grid_clear_resets_cells() {
        let mut grid = TextGrid::new(2, 1);
        grid.draw_text("ab", COLOR_INPUT, 0, 0);
        grid.clear(COLOR_BACKGROUND);
        assert_eq!(grid.cell(0, 0), Some((' ', COLOR_BACKGROUND)));
    }
}
