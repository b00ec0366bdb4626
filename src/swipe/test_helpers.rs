//! Shared test utilities for the swipe detector
//!
//! Synthetic keystroke feeds and a scheduler that only counts, so state
//! machine tests never wait on a real clock.

use super::{Scheduler, SwipeDetector, SwipeEvent};
use crate::config::SwipeConfig;
use crate::keyboard::KeyPress;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// A Luhn-valid Visa track 1 as a reader sends it
pub const VISA_SWIPE: &str = "%B4111111111111111^DOE/JOHN^2512\r";

/// Builds a detector, panicking on invalid test configuration
pub fn detector_with(config: SwipeConfig) -> SwipeDetector {
    SwipeDetector::new(&config).expect("test configuration should be valid")
}

/// Feeds every character of `text` as one keystroke and returns them
pub fn feed<S: Scheduler>(detector: &mut SwipeDetector<S>, text: &str) -> Vec<KeyPress> {
    text.chars()
        .map(|c| {
            let mut key = KeyPress::new(c);
            detector.handle_key(&mut key);
            key
        })
        .collect()
}

/// Polls well past any interdigit deadline
pub fn expire(detector: &mut SwipeDetector) -> bool {
    detector.poll(Instant::now() + Duration::from_secs(10))
}

/// Collects everything the detector has sent so far
pub fn drain(events: &Receiver<SwipeEvent>) -> Vec<SwipeEvent> {
    events.try_iter().collect()
}

/// Scheduler that records calls instead of keeping time
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pub scheduled: u32,
    pub pending: bool,
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, _delay: Duration) {
        self.scheduled += 1;
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_returns_one_key_per_char() {
        let mut detector = detector_with(SwipeConfig::default());
        let keys = feed(&mut detector, "ab\r");
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[2].code.as_u32(), 13);
    }

    #[test]
    fn manual_scheduler_counts() {
        let mut scheduler = ManualScheduler::default();
        scheduler.schedule(Duration::from_millis(1));
        scheduler.schedule(Duration::from_millis(1));
        scheduler.cancel();
        assert_eq!(scheduler.scheduled, 2);
        assert!(!scheduler.is_pending());
    }
}
