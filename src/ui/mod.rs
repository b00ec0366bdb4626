//! Terminal User Interface components

mod app;
mod widgets;

pub use app::{App, AppState, LogEntry, ScanOutcome};
pub use widgets::*;
