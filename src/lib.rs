//! Card Swipe Kit - magnetic stripe swipe detection for keyboard-emulating readers
//!
//! A card reader that emulates a keyboard replays the stripe as a fast burst
//! of keystrokes. [`swipe::SwipeDetector`] picks those bursts out of normal
//! typing, suppresses them, and hands the captured text to
//! [`decoder::Decoder`], which turns it into a [`decoder::CardRecord`].

pub mod config;
pub mod decoder;
pub mod error;
pub mod keyboard;
pub mod report;
pub mod swipe;
pub mod ui;

pub use config::Config;
pub use decoder::CardRecord;
pub use error::SwipeError;
pub use swipe::{SwipeDetector, SwipeEvent};
