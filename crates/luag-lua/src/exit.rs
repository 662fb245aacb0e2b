//! Single-slot exit mailbox.
//!
//! Scripts ask to exit from inside an interpreter call; the host drains the
//! mailbox at its next checkpoint so the call always returns cleanly.

use parking_lot::Mutex;
use std::sync::Arc;

/// A cartridge's request to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequest {
    pub code: i8,
    pub message: Option<String>,
}

/// Shared slot holding at most one pending [`ExitRequest`].
///
/// Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct ExitMailbox {
    slot: Arc<Mutex<Option<ExitRequest>>>,
}

impl ExitMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a request, replacing any unconsumed one.
    pub fn post(&self, request: ExitRequest) {
        let previous = self.slot.lock().replace(request);
        if let Some(previous) = previous {
            tracing::debug!(code = previous.code, "Unconsumed exit request overwritten");
        }
    }

    /// Removes and returns the pending request.
    pub fn take(&self) -> Option<ExitRequest> {
        self.slot.lock().take()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}
