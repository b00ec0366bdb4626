//! Scan states of the swipe detector

use std::fmt;

/// Where the detector is within a (possible) swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanState {
    /// Waiting for a start sentinel or prefix; keystrokes pass through
    #[default]
    Idle,
    /// Start sentinel seen; waiting for a format code letter
    Pending,
    /// Capturing stripe characters
    Reading,
    /// Track 1 delivered early; swallowing the rest of the swipe
    Discard,
    /// Reader prefix seen; waiting for the start sentinel
    Prefix,
}

impl ScanState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Pending => "PENDING",
            Self::Reading => "READING",
            Self::Discard => "DISCARD",
            Self::Prefix => "PREFIX",
        }
    }

    /// True in every state that belongs to a swipe attempt
    pub fn is_active(&self) -> bool {
        *self != Self::Idle
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
