//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a cloneable atomic flag shared between the thread
//! that owns a run and whoever may stop it (a Ctrl-C handler, a GUI button).
//! The interpreter checks it once per step boundary and once per smart-wait
//! poll; an already-dispatched input action is never interrupted mid-flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
