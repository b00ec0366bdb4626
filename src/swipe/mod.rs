//! Swipe detection: separating reader bursts from human typing

mod detector;
mod state;
mod stats;
mod timer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use detector::{Operation, SwipeDetector, SwipeDetectorBuilder, SwipeEvent};
pub use state::ScanState;
pub use stats::SwipeStats;
pub use timer::{DeadlineTimer, Scheduler};
