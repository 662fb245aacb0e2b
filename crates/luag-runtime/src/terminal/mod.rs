//! Line-editing terminal.
//!
//! # Architecture
//!
//! ```text
//!   write(text, is_error)          receive_input(text)
//!            │                             │
//!            ▼                             ▼
//!   ┌─────────────────┐          ┌─────────────────┐
//!   │   OutputQueue   │          │    UserQueue    │
//!   └────────┬────────┘          └────────┬────────┘
//!            │ priority                   │
//!            └──────────┬─────────────────┘
//!                       ▼  one byte per tick()
//!              ┌─────────────────┐
//!              │   ActiveLine    │── '\n' ──► Scrollback (Rows)
//!              └─────────────────┘                 │
//!                       │ Input line closed        ▼
//!                       ▼                       render()
//!                  CommandLine ──► caller dispatches
//! ```
//!
//! Both queues are bounded; bytes pushed onto a full queue are dropped.
//! System output always drains before user keystrokes, which keeps the
//! interleaving deterministic inside a single-threaded loop.
//!
//! # Example
//!
//! ```
//! use luag_runtime::terminal::Terminal;
//!
//! let mut term = Terminal::new();
//! term.receive_input("ver\n");
//!
//! let mut dispatched = None;
//! for _ in 0..4 {
//!     if let Some(cmd) = term.tick() {
//!         dispatched = Some(cmd);
//!     }
//! }
//! assert_eq!(dispatched.map(|c| c.command).as_deref(), Some("ver"));
//! ```

pub mod control;
mod display;
mod history;
mod line;
mod parser;
mod scrollback;

pub use display::{
    Clipboard, Display, MemoryClipboard, TextGrid, COLOR_BACKGROUND, COLOR_CURSOR, COLOR_ERROR,
    COLOR_INPUT, COLOR_NORMAL, CURSOR_GLYPH,
};
pub use history::{Browse, History};
pub use line::{is_printable, ActiveLine, LineKind, MAX_LINE_LEN};
pub use parser::CommandLine;
pub use scrollback::{wrap, Row};

use crate::config::TerminalConfig;
use crate::ring::{BoundedQueue, RingBuffer};

/// Which queue a byte came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    System,
    User,
}

/// The console's line editor, scrollback and command history.
pub struct Terminal {
    chars_in_row: usize,
    visible_rows: usize,
    blink_period: u32,

    active: ActiveLine,
    scrollback: RingBuffer<Row>,
    rows_written: u64,
    history: History,
    output_queue: BoundedQueue<u8>,
    user_queue: BoundedQueue<u8>,
    scroll: usize,
    blink_ticks: u32,
    clipboard: Box<dyn Clipboard + Send>,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("active", &self.active)
            .field("rows", &self.scrollback.len())
            .field("rows_written", &self.rows_written)
            .field("history", &self.history.len())
            .field("pending_output", &self.output_queue.len())
            .field("pending_input", &self.user_queue.len())
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    /// Creates a terminal with the console's standard geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&TerminalConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &TerminalConfig) -> Self {
        Self {
            chars_in_row: config.chars_in_row.max(1),
            visible_rows: config.visible_rows.max(1),
            blink_period: config.blink_period.max(1),
            active: ActiveLine::new(),
            scrollback: RingBuffer::new(config.scrollback),
            rows_written: 0,
            history: History::new(config.history),
            output_queue: BoundedQueue::new(config.buffer),
            user_queue: BoundedQueue::new(config.buffer),
            scroll: 0,
            blink_ticks: 0,
            clipboard: Box::new(MemoryClipboard::default()),
        }
    }

    /// Replaces the clipboard used by copy/paste.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard + Send>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Queues system output.
    ///
    /// Error output is prefixed with an error marker on every line. A
    /// trailing newline is appended when missing, so every write closes at
    /// least one row.
    pub fn write(&mut self, text: &str, is_error: bool) {
        let mut at_line_start = true;
        for byte in text.bytes() {
            if is_error && at_line_start {
                self.push_output(control::ERROR_MARKER);
            }
            self.push_output(byte);
            at_line_start = byte == control::NEWLINE;
        }

        if !text.ends_with('\n') {
            if is_error && text.is_empty() {
                self.push_output(control::ERROR_MARKER);
            }
            self.push_output(control::NEWLINE);
        }
    }

    /// Queues user keystrokes (printable characters and control bytes).
    pub fn receive_input(&mut self, text: &str) {
        for byte in text.bytes() {
            self.push_input(byte);
        }
    }

    /// Consumes at most one queued byte.
    ///
    /// Returns the command line when an input line was submitted; the
    /// caller runs it (typically writing output back into this terminal).
    pub fn tick(&mut self) -> Option<CommandLine> {
        let (byte, source) = if let Some(b) = self.output_queue.pop() {
            (b, Source::System)
        } else if let Some(b) = self.user_queue.pop() {
            (b, Source::User)
        } else {
            self.blink_ticks = self.blink_ticks.saturating_add(1);
            return None;
        };

        match source {
            Source::System if self.active.kind == LineKind::Input => {
                self.active.kind = LineKind::Normal;
            }
            Source::System => {}
            Source::User => self.active.kind = LineKind::Input,
        }
        self.blink_ticks = 0;

        let command = self.handle_byte(byte);
        self.follow_tail();
        command
    }

    fn handle_byte(&mut self, byte: u8) -> Option<CommandLine> {
        match byte {
            control::NEWLINE => {
                let kind = self.active.kind;
                let text = self.close_line();
                if kind == LineKind::Input {
                    self.history.record(&text);
                    return CommandLine::parse(&text);
                }
            }
            control::ERROR_MARKER => self.active.kind = LineKind::Error,
            control::BACKSPACE => self.active.backspace(),
            control::DELETE => self.active.delete(),
            control::UP => {
                if let Browse::Recall(text) = self.history.older() {
                    self.active.replace(text);
                }
            }
            control::DOWN => match self.history.newer() {
                Browse::Recall(text) => self.active.replace(text),
                Browse::Leave => self.active.clear(),
                Browse::Stay => {}
            },
            control::LEFT => self.active.move_left(),
            control::RIGHT => self.active.move_right(),
            control::ABORT => {
                self.close_line();
                self.close_line();
                self.history.reset();
            }
            control::COPY => {
                let text = self.active.text().to_string();
                self.clipboard.set_text(&text);
            }
            control::PASTE => {
                if let Some(text) = self.clipboard.get_text() {
                    for byte in text.bytes().filter(|b| is_printable(*b)) {
                        self.push_input(byte);
                    }
                }
            }
            control::CLEAR_LINE => self.active.clear(),
            b if is_printable(b) => {
                self.active.insert(b);
            }
            _ => {}
        }
        None
    }

    /// Wraps the active line into scrollback and starts a fresh one.
    /// Returns the closed text.
    fn close_line(&mut self) -> String {
        let closed = std::mem::take(&mut self.active);
        for row in wrap(closed.text(), closed.kind(), self.chars_in_row) {
            self.scrollback.push(row);
            self.rows_written += 1;
        }
        closed.text().to_string()
    }

    /// Empties scrollback and the active line and resets scrolling.
    ///
    /// Queued bytes and history are kept.
    pub fn clear(&mut self) {
        self.scrollback.clear();
        self.active.clear();
        self.scroll = 0;
    }

    /// Moves the scroll position by `delta` rows, clamped.
    pub fn scroll(&mut self, delta: i64) {
        let target = i64::try_from(self.scroll)
            .unwrap_or(i64::MAX)
            .saturating_add(delta);
        self.set_scroll(target);
    }

    fn follow_tail(&mut self) {
        let len = i64::try_from(self.scrollback.len()).unwrap_or(i64::MAX);
        let visible = i64::try_from(self.visible_rows).unwrap_or(i64::MAX);
        self.set_scroll(len - visible + 1);
    }

    fn set_scroll(&mut self, target: i64) {
        let clamped = target.clamp(0, i64::try_from(self.max_scroll()).unwrap_or(i64::MAX));
        self.scroll = usize::try_from(clamped).unwrap_or(0);
    }

    fn max_scroll(&self) -> usize {
        (self.scrollback.len() + 1).saturating_sub(self.visible_rows)
    }

    /// Draws the visible rows and, if room is left, the active line with its
    /// blinking cursor.
    pub fn render(&self, display: &mut dyn Display) {
        display.clear(COLOR_BACKGROUND);

        let mut drawn = 0;
        for row in self
            .scrollback
            .iter()
            .skip(self.scroll)
            .take(self.visible_rows)
        {
            display.draw_text(row.text(), row.color(), 0, drawn);
            drawn += 1;
        }

        if drawn < self.visible_rows {
            display.draw_text(self.active.text(), self.active.kind().color(), 0, drawn);
            if self.cursor_visible() {
                display.draw_text(CURSOR_GLYPH, COLOR_CURSOR, self.active.cursor(), drawn);
            }
        }
    }

    /// The cursor shows while typing or idling, during the on-phase of the
    /// blink cycle.
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        let active = self.active.kind() == LineKind::Input || self.blink_ticks != 0;
        active && (self.blink_ticks / self.blink_period) % 2 == 0
    }

    /// Total rows ever closed, including rows since evicted or cleared.
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows closed after `mark` (a previous [`rows_written`] value) that are
    /// still in scrollback, oldest first.
    ///
    /// [`rows_written`]: Self::rows_written
    pub fn rows_since(&self, mark: u64) -> impl Iterator<Item = &Row> {
        let new = usize::try_from(self.rows_written.saturating_sub(mark)).unwrap_or(usize::MAX);
        let skip = self.scrollback.len().saturating_sub(new);
        self.scrollback.iter().skip(skip)
    }

    /// Scrollback, oldest first.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.scrollback.iter()
    }

    #[must_use]
    pub fn active_line(&self) -> &ActiveLine {
        &self.active
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn scroll_position(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    #[must_use]
    pub fn chars_in_row(&self) -> usize {
        self.chars_in_row
    }

    /// Returns `true` when both queues are drained.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.output_queue.is_empty() && self.user_queue.is_empty()
    }

    /// Bytes waiting in the output queue.
    #[must_use]
    pub fn pending_output(&self) -> usize {
        self.output_queue.len()
    }

    fn push_output(&mut self, byte: u8) {
        if self.output_queue.push(byte).is_err() {
            tracing::trace!("Output queue full, byte dropped");
        }
    }

    fn push_input(&mut self, byte: u8) {
        if self.user_queue.push(byte).is_err() {
            tracing::trace!("Input queue full, byte dropped");
        }
    }
}
