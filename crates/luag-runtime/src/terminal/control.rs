//! Control bytes understood by the terminal.
//!
//! Keyboard frontends translate special keys into these bytes before
//! handing them to [`Terminal::receive_input`](super::Terminal::receive_input).

/// Closes the active line.
pub const NEWLINE: u8 = b'\n';
/// Marks the active line as an error line. Never displayed.
pub const ERROR_MARKER: u8 = 0x0B;
/// Deletes the character left of the cursor.
pub const BACKSPACE: u8 = 0x08;
/// Deletes the character at the cursor.
pub const DELETE: u8 = 0x7F;
/// Recalls an older history entry.
pub const UP: u8 = 0x11;
/// Moves the cursor left.
pub const LEFT: u8 = 0x12;
/// Recalls a newer history entry.
pub const DOWN: u8 = 0x13;
/// Moves the cursor right.
pub const RIGHT: u8 = 0x14;
/// Abandons the active line without running it.
pub const ABORT: u8 = 0x15;
/// Copies the active line to the clipboard.
pub const COPY: u8 = 0x16;
/// Types the clipboard content.
pub const PASTE: u8 = 0x17;
/// Empties the active line.
pub const CLEAR_LINE: u8 = 0x18;
