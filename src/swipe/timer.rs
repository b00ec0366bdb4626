//! Interdigit timer
//!
//! The detector never sleeps. It asks a [`Scheduler`] to arm or disarm a
//! single deadline, and the host reports expiry back through
//! [`SwipeDetector::on_timeout`](super::SwipeDetector::on_timeout).

use std::time::{Duration, Instant};

/// One cancellable deferred callback
pub trait Scheduler {
    /// Replace any pending deadline with one `delay` from now
    fn schedule(&mut self, delay: Duration);

    /// Drop the pending deadline, if any
    fn cancel(&mut self);

    /// Whether a deadline is currently armed
    fn is_pending(&self) -> bool;
}

/// Scheduler backed by a polled [`Instant`] deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once `now` has reached an armed deadline
    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left before expiry, or `None` when disarmed
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

impl Scheduler for DeadlineTimer {
    fn schedule(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
