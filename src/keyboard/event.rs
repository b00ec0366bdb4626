//! Keypress events as seen by the swipe detector

use super::CharCode;

/// Capability a host keystroke type exposes to the detector.
///
/// The detector reads the character code and, for keystrokes that belong
/// to a swipe, marks them handled so the host neither applies their default
/// effect nor forwards them any further.
pub trait Keystroke {
    /// Character code of the key
    fn code(&self) -> CharCode;

    /// Suppress the default effect and further propagation
    fn suppress(&mut self);
}

/// A keypress event owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The character code
    pub code: CharCode,
    /// Whether the detector claimed this keystroke
    handled: bool,
}

impl KeyPress {
    pub fn new(code: impl Into<CharCode>) -> Self {
        Self {
            code: code.into(),
            handled: false,
        }
    }

    /// True when the keystroke was swallowed by a swipe
    pub fn is_handled(&self) -> bool {
        self.handled
    }
}

impl Keystroke for KeyPress {
    fn code(&self) -> CharCode {
        self.code
    }

    fn suppress(&mut self) {
        self.handled = true;
    }
}
