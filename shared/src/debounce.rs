//! Cancellable delayed commit for rapidly changing input.
//!
//! The debouncer does not own a clock. The caller schedules a value, asks
//! the shell for a delay of [`Debouncer::interval`], and settles the returned
//! handle when the delay fires. Scheduling again supersedes the pending
//! handle, so only the last value of a burst is ever committed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies one scheduled value. Handles are never reused by a debouncer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebounceHandle(u64);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    generation: u64,
    pending: Option<(DebounceHandle, T)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Replaces any pending value and returns the handle to settle later.
    pub fn schedule(&mut self, value: T) -> DebounceHandle {
        self.generation += 1;
        let handle = DebounceHandle(self.generation);
        self.pending = Some((handle, value));
        handle
    }

    /// Takes the pending value if `handle` is still the latest one.
    /// A superseded or already settled handle yields nothing.
    pub fn settle(&mut self, handle: DebounceHandle) -> Option<T> {
        match self.pending.take() {
            Some((current, value)) if current == handle => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Drops the pending value. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn current_handle(&self) -> Option<DebounceHandle> {
        self.pending.as_ref().map(|(handle, _)| *handle)
    }

    #[must_use]
    pub fn pending_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }
}

/// Which of the two free-text price boxes a keystroke belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PriceField {
    Min,
    Max,
}
