//! Tracing writers for the terminal and file log layers.
//!
//! Stdout belongs to the console screen, so diagnostics never go there:
//!
//! - [`LogSink::Stderr`]: the terminal layer, filtered by `--debug`/`RUST_LOG`
//! - [`LogSink::File`]: the persistent log file. The file layer should be
//!   configured with `.with_ansi(false)` so the file stays plain text.
//!
//! Each event is buffered and written in one call when its writer drops, so
//! lines from different threads never interleave.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Destination of one log layer.
#[derive(Clone)]
pub enum LogSink {
    Stderr,
    File(Arc<Mutex<File>>),
}

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) producing one
/// buffered [`LogWriter`] per event.
#[derive(Clone)]
pub struct LogMakeWriter {
    sink: LogSink,
}

impl LogMakeWriter {
    pub fn stderr() -> Self {
        Self {
            sink: LogSink::Stderr,
        }
    }

    pub fn file(file: Arc<Mutex<File>>) -> Self {
        Self {
            sink: LogSink::File(file),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogMakeWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            sink: self.sink.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer. Flushes its buffer to the sink on [`Drop`].
pub struct LogWriter {
    sink: LogSink,
    buf: Vec<u8>,
}

impl Write for LogWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        // Logging must never take the console down; write errors are dropped.
        match &self.sink {
            LogSink::Stderr => {
                let mut stderr = io::stderr().lock();
                let _ = stderr.write_all(&self.buf);
                let _ = stderr.flush();
            }
            LogSink::File(file) => {
                let mut file = file.lock();
                let _ = file.write_all(&self.buf);
                let _ = file.flush();
            }
        }
    }
}

/// Opens the log file in append mode, creating its directory.
///
/// Returns `None` (after a warning on stderr) if that fails; file logging
/// is optional.
pub fn open_log_file(path: &Path) -> Option<Arc<Mutex<File>>> {
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: cannot create log directory {}: {e}", dir.display());
            return None;
        }
    }

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => Some(Arc::new(Mutex::new(file))),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", path.display());
            None
        }
    }
}
