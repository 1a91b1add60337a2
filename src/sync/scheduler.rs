use std::time::{Duration, Instant};

use crate::store::ProgressUpdate;

/// Debounce window plus a single in-flight slot.
///
/// The clock is passed in so the worker and the tests drive it the same way.
#[derive(Debug)]
pub struct DebounceScheduler {
    window: Duration,
    pending: Option<ProgressUpdate>,
    deadline: Option<Instant>,
    in_flight: bool,
}

impl DebounceScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
            in_flight: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a newer snapshot and restart the window.
    pub fn signal(&mut self, update: ProgressUpdate, now: Instant) {
        self.pending = Some(update);
        self.deadline = Some(now + self.window);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// How long the worker may sleep before `poll` could return something.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Hand out the snapshot to write once the window has passed quietly.
    /// Nothing is handed out while a previous write is still outstanding.
    pub fn poll(&mut self, now: Instant) -> Option<ProgressUpdate> {
        if self.in_flight {
            return None;
        }
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                let update = self.pending.take()?;
                self.in_flight = true;
                Some(update)
            }
            _ => None,
        }
    }

    /// The outstanding write finished (successfully or not).
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Drain the pending snapshot regardless of the window, for teardown.
    pub fn take_pending(&mut self) -> Option<ProgressUpdate> {
        self.deadline = None;
        self.pending.take()
    }
}
