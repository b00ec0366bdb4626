//! Character codes delivered by keyboard-emulating card readers

use std::fmt;

/// A printable character code, as reported by a keypress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharCode(pub u32);

/// Start sentinel of track 1
pub const PERCENT: CharCode = CharCode(37);
/// End sentinel of every track
pub const QUESTION: CharCode = CharCode(63);
/// Carriage return sent by the reader after the last track
pub const CARRIAGE_RETURN: CharCode = CharCode(13);

impl CharCode {
    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Converts the code back into the character it represents.
    ///
    /// Codes outside the Unicode scalar range map to U+FFFD.
    pub fn to_char(self) -> char {
        char::from_u32(self.0).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Format code test: `A`-`Z`, or `a`-`z` when caps lock inverts the reader output
    pub fn is_format_code(self) -> bool {
        matches!(self.0, 65..=90 | 97..=122)
    }
}

impl From<u32> for CharCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<char> for CharCode {
    fn from(c: char) -> Self {
        Self(c as u32)
    }
}

impl From<crossterm::event::KeyCode> for CharCode {
    fn from(code: crossterm::event::KeyCode) -> Self {
        use crossterm::event::KeyCode as CK;
        match code {
            CK::Char(c) => Self::from(c),
            CK::Enter => CARRIAGE_RETURN,
            CK::Tab => Self(9),
            CK::Backspace => Self(8),
            // Non-printable keys never start or continue a swipe
            _ => Self(0),
        }
    }
}

impl fmt::Display for CharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            13 => write!(f, "13: <CR>"),
            code => write!(f, "{}: {}", code, self.to_char()),
        }
    }
}
