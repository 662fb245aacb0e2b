//! Text frontend: stdin in, scrollback rows out.
//!
//! The terminal's rows are streamed to stdout as they close. Error rows are
//! coloured when stdout is a TTY. When stdin is piped, input rows are echoed
//! with a `> ` prefix so transcripts read like a session.

use luag_runtime::terminal::{Clipboard, LineKind, MemoryClipboard};
use luag_runtime::Terminal;
use std::io::{self, BufRead, IsTerminal, Write};
use tokio::sync::mpsc;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Prints closed terminal rows to stdout.
#[derive(Debug)]
pub struct StdoutFrontend {
    mark: u64,
    color: bool,
    echo_input: bool,
}

impl StdoutFrontend {
    /// Detects colour and echo settings from the process streams.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            mark: 0,
            color: io::stdout().is_terminal(),
            echo_input: !io::stdin().is_terminal(),
        }
    }

    /// Prints every row closed since the previous call.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn present(&mut self, terminal: &Terminal) -> io::Result<()> {
        let written = terminal.rows_written();
        if written == self.mark {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        for row in terminal.rows_since(self.mark) {
            match row.kind() {
                LineKind::Input if self.echo_input => writeln!(out, "> {}", row.text())?,
                LineKind::Input => {}
                LineKind::Error if self.color => writeln!(out, "{RED}{}{RESET}", row.text())?,
                LineKind::Error | LineKind::Normal => writeln!(out, "{}", row.text())?,
            }
        }
        out.flush()?;
        self.mark = written;
        Ok(())
    }
}

/// Reads stdin on a dedicated thread and forwards each line, newline
/// included, to `tx`. The channel closes on EOF.
pub fn spawn_stdin_reader(tx: mpsc::Sender<String>) -> io::Result<()> {
    std::thread::Builder::new()
        .name("luag-stdin".into())
        .spawn(move || {
            let stdin = io::stdin();
            let mut reader = stdin.lock();
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let text = String::from_utf8_lossy(&buf).into_owned();
                        if tx.blocking_send(text).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reading stdin failed");
                        break;
                    }
                }
            }
            tracing::debug!("stdin closed");
        })?;
    Ok(())
}

/// System clipboard through `arboard`, with a process-local fallback when
/// no clipboard service is reachable.
#[derive(Debug, Default)]
pub struct SystemClipboard {
    fallback: MemoryClipboard,
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        match arboard::Clipboard::new().and_then(|mut c| c.get_text()) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(error = %e, "System clipboard unavailable");
                self.fallback.get_text()
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        self.fallback.set_text(text);
        if let Err(e) = arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
            tracing::debug!(error = %e, "System clipboard unavailable");
        }
    }
}
