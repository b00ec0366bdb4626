//! Main application state and logic

use super::widgets::Entry;
use crate::config::Config;
use crate::decoder::CardRecord;
use crate::error::SwipeError;
use crate::keyboard::{CharCode, KeyPress};
use crate::report::SessionReport;
use crate::swipe::{SwipeDetector, SwipeEvent};
use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use std::cell::Cell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Entries kept in the notification log
const LOG_CAPACITY: usize = 100;

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// What the last finished scan produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(CardRecord),
    Failed,
}

/// A timestamped notification
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub entry: Entry,
}

/// Main application
pub struct App {
    /// Application state
    pub state: AppState,
    /// Configuration
    pub config: Config,
    /// The swipe detector all keystrokes go through
    pub detector: SwipeDetector,
    events: Receiver<SwipeEvent>,
    /// Set by the detector when a swipe takes over the keyboard
    focus_released: Rc<Cell<bool>>,
    /// Text typed into the input field (keystrokes the detector let through)
    pub typed: String,
    /// Whether the input field holds focus
    pub input_focused: bool,
    /// Result of the most recent scan
    pub last_outcome: Option<ScanOutcome>,
    /// Notification log, newest last
    pub log: VecDeque<LogEntry>,
    /// Application start time
    pub start_time: Instant,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl App {
    pub fn new(config: Config) -> Result<Self, SwipeError> {
        let focus_released = Rc::new(Cell::new(false));
        let flag = Rc::clone(&focus_released);

        // Records are displayed from notifications, not logged
        let mut detector = SwipeDetector::builder(config.swipe.clone())
            .on_complete(|_| {})
            .on_release_focus(move || flag.set(true))
            .build()?;
        let events = detector.subscribe();

        Ok(Self {
            state: AppState::Running,
            config,
            detector,
            events,
            focus_released,
            typed: String::new(),
            input_focused: true,
            last_outcome: None,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            start_time: Instant::now(),
            status_message: None,
            status_time: None,
        })
    }

    /// Route a terminal key through the detector, then to the input field
    pub fn process_key(&mut self, code: KeyCode) {
        self.process_key_at(code, Instant::now());
    }

    /// Like [`App::process_key`] for a key read at `now`.
    ///
    /// An overdue timeout fires first, so a late key starts fresh instead
    /// of extending a swipe that already ended.
    pub fn process_key_at(&mut self, code: KeyCode, now: Instant) {
        self.tick(now);

        let mut key = KeyPress::new(CharCode::from(code));
        self.detector.handle_key(&mut key);
        if self.focus_released.take() {
            self.input_focused = false;
        }

        if !key.is_handled() {
            self.type_key(code);
        }
        self.drain_events();
    }

    /// Fire the interdigit timeout once its deadline passes
    pub fn tick(&mut self, now: Instant) {
        if self.detector.poll(now) {
            self.drain_events();
        }
    }

    /// How long the event loop may block: a frame, or less if a swipe is pending
    pub fn poll_timeout(&self, now: Instant, frame: Duration) -> Duration {
        self.detector
            .time_until_timeout(now)
            .map_or(frame, |remaining| remaining.min(frame))
    }

    fn type_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.typed.push(c),
            KeyCode::Backspace => {
                self.typed.pop();
            }
            KeyCode::Enter => self.typed.clear(),
            _ => return,
        }
        self.input_focused = true;
    }

    fn drain_events(&mut self) {
        let events: Vec<SwipeEvent> = self.events.try_iter().collect();
        for event in events {
            match event {
                SwipeEvent::ScanStart => self.push_log(Entry::info("Scan", "started")),
                SwipeEvent::ScanEnd => self.push_log(Entry::info("Scan", "ended")),
                SwipeEvent::Success(record) => {
                    self.push_log(Entry::ok("Decoded", record.kind()));
                    self.set_status(format!("Decoded {} card", record.kind()));
                    self.last_outcome = Some(ScanOutcome::Decoded(record));
                }
                SwipeEvent::Failure => {
                    self.push_log(Entry::error("Failed", "no parser matched"));
                    self.set_status("Swipe not recognised".to_string());
                    self.last_outcome = Some(ScanOutcome::Failed);
                }
            }
        }
    }

    fn push_log(&mut self, entry: Entry) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry {
            at: Local::now(),
            entry,
        });
    }

    /// Toggle keystroke capture
    pub fn toggle_enabled(&mut self) {
        if self.detector.is_enabled() {
            self.detector.disable();
            self.set_status("Capture disabled".to_string());
        } else {
            self.detector.enable();
            self.set_status("Capture enabled".to_string());
        }
        self.drain_events();
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Clear input, results, log and counters
    pub fn reset_all(&mut self) {
        self.typed.clear();
        self.input_focused = true;
        self.last_outcome = None;
        self.log.clear();
        self.detector.reset_stats();
        self.start_time = Instant::now();
        self.set_status("Session reset".to_string());
    }

    /// Set a status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still within its display time
    pub fn get_status(&self) -> Option<&str> {
        let lifetime = self.config.ui.status_duration_secs;
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed().as_secs() < lifetime => Some(msg),
            _ => None,
        }
    }

    /// Entries for the last scan panel
    pub fn outcome_entries(&self) -> Vec<Entry> {
        match &self.last_outcome {
            None => vec![Entry::info("Waiting", "swipe a card")],
            Some(ScanOutcome::Failed) => vec![Entry::error("Result", "no parser matched")],
            Some(ScanOutcome::Decoded(record)) => {
                let mut entries = vec![Entry::ok("Result", record.kind())];
                entries.extend(
                    record
                        .display_lines()
                        .into_iter()
                        .map(|(label, value)| Entry::info(label, value)),
                );
                entries
            }
        }
    }

    /// Log entries, newest first
    pub fn log_entries(&self) -> Vec<Entry> {
        self.log
            .iter()
            .rev()
            .map(|item| {
                Entry::new(
                    format!("{} {}", item.at.format("%H:%M:%S"), item.entry.label),
                    item.entry.value.clone(),
                    item.entry.status,
                )
            })
            .collect()
    }

    /// Detector counters for the summary panel
    pub fn summary_entries(&self) -> Vec<Entry> {
        let stats = self.detector.stats();
        let mut entries = vec![
            Entry::info("Parsers", self.detector.parser_names().collect::<Vec<_>>().join(", ")),
            Entry::info(
                "Timeout",
                format!("{} ms", self.detector.interdigit_timeout().as_millis()),
            ),
            Entry::info("Suppressed", format!("{} / {}", stats.suppressed, stats.keystrokes)),
            Entry::ok("Decoded", stats.decoded.to_string()),
        ];
        entries.push(if stats.failed > 0 {
            Entry::warning("Failed", stats.failed.to_string())
        } else {
            Entry::info("Failed", "0")
        });
        entries.push(Entry::info("Abandoned", stats.abandoned.to_string()));
        entries
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Generate a session report
    pub fn generate_report(&self) -> SessionReport {
        SessionReport::new(
            self.start_time,
            self.detector.stats(),
            self.detector.parser_names().map(str::to_string).collect(),
            self.detector.interdigit_timeout().as_millis() as u64,
        )
    }

    /// Export session report to JSON file
    pub fn export_report(&mut self, filename: &str) -> Result<String, std::io::Error> {
        let report = self.generate_report();
        report.export_json(Path::new(filename))?;
        let msg = format!("Exported to {}", filename);
        self.set_status(msg.clone());
        Ok(msg)
    }
}
