//! Submitted command history.

use crate::ring::RingBuffer;

/// Outcome of a history navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browse<'a> {
    /// Show this entry on the active line.
    Recall(&'a str),
    /// Browsing went past the newest entry; empty the active line.
    Leave,
    /// Nothing to do.
    Stay,
}

/// Bounded history of submitted commands.
///
/// The browse index is `None` when not browsing; `Some(0)` is the most
/// recent entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: RingBuffer<String>,
    index: Option<usize>,
}

impl History {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
            index: None,
        }
    }

    /// Records a submitted line and stops browsing.
    ///
    /// Blank or whitespace-only lines are never recorded; returns whether
    /// the line was kept.
    pub fn record(&mut self, line: &str) -> bool {
        self.index = None;
        if line.trim().is_empty() {
            return false;
        }
        self.entries.push(line.to_string());
        true
    }

    /// Steps towards older entries, stopping at the oldest.
    pub fn older(&mut self) -> Browse<'_> {
        if self.entries.is_empty() {
            return Browse::Stay;
        }
        let last = self.entries.len() - 1;
        let next = self.index.map_or(0, |i| (i + 1).min(last));
        self.index = Some(next);
        self.entries
            .get_newest(next)
            .map_or(Browse::Stay, |s| Browse::Recall(s))
    }

    /// Steps towards newer entries; stepping past the newest leaves
    /// browsing.
    pub fn newer(&mut self) -> Browse<'_> {
        match self.index {
            None => Browse::Stay,
            Some(0) => {
                self.index = None;
                Browse::Leave
            }
            Some(i) => {
                self.index = Some(i - 1);
                self.entries
                    .get_newest(i - 1)
                    .map_or(Browse::Stay, |s| Browse::Recall(s))
            }
        }
    }

    /// Stops browsing without recording anything.
    pub fn reset(&mut self) {
        self.index = None;
    }

    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.entries.iter().map(String::as_str)
    }
}
