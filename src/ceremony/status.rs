//! Status output channel
//!
//! Each flow invocation publishes exactly one status line: the success
//! confirmation or `"Error: <message>"`. Where it goes is up to the caller.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives the single status line of a flow invocation
pub trait StatusSink: Send + Sync {
    fn publish(&self, message: &str);
}

/// Writes status lines to the log
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn publish(&self, message: &str) {
        log::info!("{message}");
    }
}

/// Forwards status lines to a closure (UI bindings, channels)
pub struct FnStatusSink<F>(F);

impl<F> FnStatusSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> StatusSink for FnStatusSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn publish(&self, message: &str) {
        (self.0)(message);
    }
}

/// Keeps only the most recent status line, like a single status element
#[derive(Clone, Default)]
pub struct LatestStatus {
    slot: Arc<Mutex<Option<String>>>,
}

impl LatestStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status line, if any flow has settled
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for LatestStatus {
    fn publish(&self, message: &str) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }
}
