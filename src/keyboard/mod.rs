//! Keystroke types and character codes

mod event;
pub mod keymap;

pub use event::{KeyPress, Keystroke};
pub use keymap::{CharCode, CARRIAGE_RETURN, PERCENT, QUESTION};
