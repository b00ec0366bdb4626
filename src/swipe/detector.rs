//! Swipe detector state machine
//!
//! A keyboard-emulating reader replays the stripe as a burst of keystrokes
//! framed by `%` ... `?` (with optional `;`/`+` tracks) and a final carriage
//! return. Human typing almost never starts with `%` followed by a letter,
//! and is far slower than the reader, so the detector combines the framing
//! characters with an interdigit timeout to tell the two apart.
//!
//! | State   | Key                         | Next    |
//! |---------|-----------------------------|---------|
//! | IDLE    | `%`                         | PENDING |
//! | IDLE    | prefix                      | PREFIX  |
//! | PENDING | `A`-`Z`, `a`-`z`            | READING |
//! | PENDING | anything else (passed on)   | IDLE    |
//! | READING | CR (decode)                 | IDLE    |
//! | READING | `?` with first-line-only    | DISCARD |
//! | DISCARD | CR                          | IDLE    |
//! | PREFIX  | prefix (passed on)          | IDLE    |
//! | PREFIX  | `%`                         | PENDING |
//!
//! Timer expiry decodes the buffer if READING and always returns to IDLE.

use super::{DeadlineTimer, ScanState, Scheduler, SwipeStats};
use crate::config::SwipeConfig;
use crate::decoder::{resolve_names, CardRecord, CustomParser, Decoder, ParserRef};
use crate::error::SwipeError;
use crate::keyboard::{CharCode, Keystroke, CARRIAGE_RETURN, PERCENT, QUESTION};
use log::{debug, info, trace, warn};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Notifications raised to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeEvent {
    /// Entered READING
    ScanStart,
    /// Left READING
    ScanEnd,
    /// A parser produced a record
    Success(CardRecord),
    /// No parser matched
    Failure,
}

type RecordCallback = Box<dyn FnMut(&CardRecord)>;
type RawCallback = Box<dyn FnMut(&str)>;
type FocusCallback = Box<dyn FnMut()>;

struct Callbacks {
    complete: RecordCallback,
    error: Option<RawCallback>,
    raw_data: Option<RawCallback>,
    release_focus: Option<FocusCallback>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            complete: Box::new(log_record),
            error: None,
            raw_data: None,
            release_focus: None,
        }
    }
}

/// Default completion callback
fn log_record(record: &CardRecord) {
    for (label, value) in record.display_lines() {
        info!("{}: {}", label, value);
    }
}

/// Validated detector options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    interdigit_timeout: Duration,
    first_line_only: bool,
    prefix_code: Option<CharCode>,
    debug: bool,
}

impl Settings {
    fn from_config(config: &SwipeConfig) -> Result<Self, SwipeError> {
        Ok(Self {
            interdigit_timeout: config.interdigit_timeout()?,
            first_line_only: config.first_line_only,
            prefix_code: config.prefix_code()?,
            debug: config.debug,
        })
    }
}

/// Operations a host can request by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Enable,
    Disable,
    /// Decode the given raw data directly
    Decode(String),
}

impl Operation {
    /// Looks up an operation by name; `arg` is the raw data for `decode`
    pub fn parse(name: &str, arg: Option<&str>) -> Result<Self, SwipeError> {
        match name {
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            "decode" => arg
                .map(|raw| Self::Decode(raw.to_string()))
                .ok_or_else(|| SwipeError::MissingArgument(name.to_string())),
            other => Err(SwipeError::UnknownOperation(other.to_string())),
        }
    }
}

/// Collects configuration, parsers and callbacks for a [`SwipeDetector`]
pub struct SwipeDetectorBuilder {
    config: SwipeConfig,
    custom: Vec<CustomParser>,
    parsers: Option<Vec<ParserRef>>,
    callbacks: Callbacks,
}

impl SwipeDetectorBuilder {
    /// Register a parser that configured names can refer to
    pub fn custom_parser(mut self, parser: CustomParser) -> Self {
        self.custom.push(parser);
        self
    }

    /// Use this parser list instead of the configured names
    pub fn parsers(mut self, parsers: Vec<ParserRef>) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Called with each decoded record. Replaces the default, which logs it.
    pub fn on_complete(mut self, f: impl FnMut(&CardRecord) + 'static) -> Self {
        self.callbacks.complete = Box::new(f);
        self
    }

    /// Called with the raw data when no parser matches
    pub fn on_error(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.callbacks.error = Some(Box::new(f));
        self
    }

    /// Called with the raw data of every captured scan, before decoding
    pub fn on_raw_data(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.callbacks.raw_data = Some(Box::new(f));
        self
    }

    /// Called when a swipe is recognised, so the host can drop input focus
    pub fn on_release_focus(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.release_focus = Some(Box::new(f));
        self
    }

    /// Validate the configuration and build a detector with a [`DeadlineTimer`]
    pub fn build(self) -> Result<SwipeDetector, SwipeError> {
        self.build_with(DeadlineTimer::new())
    }

    /// Validate the configuration and build a detector driving `timer`
    pub fn build_with<S: Scheduler>(self, timer: S) -> Result<SwipeDetector<S>, SwipeError> {
        let settings = Settings::from_config(&self.config)?;
        let parsers = match self.parsers {
            Some(parsers) => parsers,
            None => resolve_names(&self.config.parsers, &self.custom)?,
        };
        let decoder = Decoder::new(&parsers);

        if settings.debug {
            debug!("swipe detector initialised: {:?}, parsers {:?}", settings, decoder);
        }

        Ok(SwipeDetector {
            settings,
            decoder,
            custom: self.custom,
            callbacks: self.callbacks,
            state: ScanState::Idle,
            buffer: None,
            timer,
            enabled: self.config.enabled,
            subscribers: Vec::new(),
            stats: SwipeStats::new(),
        })
    }
}

/// Detects card swipes in a keystroke stream and decodes them.
///
/// Each instance owns its state, buffer and timer, so several detectors can
/// run side by side. Keystrokes must be delivered one at a time, in order.
pub struct SwipeDetector<S = DeadlineTimer> {
    settings: Settings,
    decoder: Decoder,
    custom: Vec<CustomParser>,
    callbacks: Callbacks,
    state: ScanState,
    /// Present only while a swipe attempt is being captured
    buffer: Option<Vec<char>>,
    timer: S,
    enabled: bool,
    subscribers: Vec<mpsc::Sender<SwipeEvent>>,
    stats: SwipeStats,
}

impl SwipeDetector<DeadlineTimer> {
    pub fn builder(config: SwipeConfig) -> SwipeDetectorBuilder {
        SwipeDetectorBuilder {
            config,
            custom: Vec::new(),
            parsers: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Build a detector from configuration alone, with default callbacks
    pub fn new(config: &SwipeConfig) -> Result<Self, SwipeError> {
        Self::builder(config.clone()).build()
    }

    /// Fire the interdigit timeout if its deadline has passed by `now`.
    ///
    /// Returns true when the timeout fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.timer.expired(now) {
            self.on_timeout();
            true
        } else {
            false
        }
    }

    /// Time until the pending timeout, if one is armed
    pub fn time_until_timeout(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }
}

impl<S: Scheduler> SwipeDetector<S> {
    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> &SwipeStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn interdigit_timeout(&self) -> Duration {
        self.settings.interdigit_timeout
    }

    pub fn parser_names(&self) -> impl Iterator<Item = &str> {
        self.decoder.parser_names()
    }

    /// Number of characters captured by the current attempt
    pub fn buffered_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    pub fn is_timer_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Receive notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::Receiver<SwipeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Begin intercepting keystrokes
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop intercepting keystrokes. An attempt in progress is dropped.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.abort();
    }

    /// Re-apply configuration, keeping callbacks and registered parsers.
    ///
    /// Nothing changes if the new configuration is invalid.
    pub fn reconfigure(&mut self, config: &SwipeConfig) -> Result<(), SwipeError> {
        let settings = Settings::from_config(config)?;
        let parsers = resolve_names(&config.parsers, &self.custom)?;

        self.abort();
        self.settings = settings;
        self.decoder = Decoder::new(&parsers);
        self.enabled = config.enabled;
        Ok(())
    }

    /// Run a named operation
    pub fn apply(&mut self, operation: Operation) -> Result<Option<CardRecord>, SwipeError> {
        match operation {
            Operation::Enable => self.enable(),
            Operation::Disable => self.disable(),
            Operation::Decode(raw) => return Ok(self.decode(&raw)),
        }
        Ok(None)
    }

    /// Decode raw stripe data without going through keystroke capture.
    ///
    /// Raises success or failure and runs the callbacks, but never
    /// scan-start or scan-end.
    pub fn decode(&mut self, raw: &str) -> Option<CardRecord> {
        if self.settings.debug {
            debug!("decoding {:?}", raw);
        }

        match self.decoder.decode(raw) {
            Some(record) => {
                self.stats.record_decoded(record.kind());
                (self.callbacks.complete)(&record);
                self.emit(SwipeEvent::Success(record.clone()));
                Some(record)
            }
            None => {
                self.stats.failed += 1;
                warn!("no parser matched {} characters of swipe data", raw.chars().count());
                if let Some(error) = self.callbacks.error.as_mut() {
                    error(raw);
                }
                self.emit(SwipeEvent::Failure);
                None
            }
        }
    }

    /// Feed one keystroke through the state machine.
    ///
    /// Swipe keystrokes are suppressed; everything else is left untouched
    /// for the host to handle normally.
    pub fn handle_key<K: Keystroke>(&mut self, key: &mut K) {
        if !self.enabled {
            return;
        }

        let code = key.code();
        if self.settings.debug {
            debug!("{}", code);
        } else {
            trace!("{}", code);
        }

        let suppress = self.step(code);
        if suppress {
            key.suppress();
        }
        self.stats.record_keystroke(suppress);
    }

    /// Interdigit timeout expired.
    ///
    /// A READING attempt is decoded as if the reader had sent CR; any other
    /// attempt is dropped. Calls with no pending timer are ignored.
    pub fn on_timeout(&mut self) {
        if !self.timer.is_pending() {
            return;
        }
        self.timer.cancel();

        if self.settings.debug {
            debug!("Timeout!");
        }

        match self.state {
            ScanState::Reading => self.complete(),
            ScanState::Pending | ScanState::Prefix => self.stats.abandoned += 1,
            ScanState::Idle | ScanState::Discard => {}
        }

        self.buffer = None;
        self.set_state(ScanState::Idle);
    }

    /// Returns whether the keystroke belongs to the swipe
    fn step(&mut self, code: CharCode) -> bool {
        match self.state {
            ScanState::Idle => {
                if code == PERCENT {
                    self.set_state(ScanState::Pending);
                    self.start_buffer(code);
                    self.restart_timer();
                    true
                } else if self.is_prefix(code) {
                    self.set_state(ScanState::Prefix);
                    self.restart_timer();
                    true
                } else {
                    false
                }
            }

            ScanState::Pending => {
                if code.is_format_code() {
                    self.set_state(ScanState::Reading);
                    if let Some(release) = self.callbacks.release_focus.as_mut() {
                        release();
                    }
                    self.push(code);
                    self.restart_timer();
                    true
                } else {
                    self.stats.abandoned += 1;
                    self.abort();
                    false
                }
            }

            ScanState::Reading => {
                self.push(code);
                if code == CARRIAGE_RETURN {
                    self.timer.cancel();
                    self.set_state(ScanState::Idle);
                    self.complete();
                } else if code == QUESTION && self.settings.first_line_only {
                    // End of track 1: decode now, swallow the rest of the swipe
                    self.restart_timer();
                    self.set_state(ScanState::Discard);
                    self.complete();
                } else {
                    self.restart_timer();
                }
                true
            }

            ScanState::Discard => {
                if code == CARRIAGE_RETURN {
                    self.timer.cancel();
                    self.set_state(ScanState::Idle);
                } else {
                    self.restart_timer();
                }
                true
            }

            ScanState::Prefix => {
                if self.is_prefix(code) {
                    self.timer.cancel();
                    self.set_state(ScanState::Idle);
                    false
                } else if code == PERCENT {
                    self.set_state(ScanState::Pending);
                    self.start_buffer(code);
                    self.restart_timer();
                    true
                } else {
                    self.restart_timer();
                    true
                }
            }
        }
    }

    /// The only place the state changes
    fn set_state(&mut self, next: ScanState) {
        let previous = self.state;
        if self.settings.debug {
            debug!("{} -> {}", previous, next);
        }

        if next == ScanState::Reading && previous != ScanState::Reading {
            self.stats.scans_started += 1;
            self.emit(SwipeEvent::ScanStart);
        }
        if previous == ScanState::Reading && next != ScanState::Reading {
            self.emit(SwipeEvent::ScanEnd);
        }

        self.state = next;
    }

    fn is_prefix(&self, code: CharCode) -> bool {
        self.settings.prefix_code == Some(code)
    }

    fn start_buffer(&mut self, code: CharCode) {
        self.buffer = Some(vec![code.to_char()]);
    }

    fn push(&mut self, code: CharCode) {
        self.buffer.get_or_insert_with(Vec::new).push(code.to_char());
    }

    fn restart_timer(&mut self) {
        self.timer.schedule(self.settings.interdigit_timeout);
    }

    /// Drop any attempt in progress and return to IDLE
    fn abort(&mut self) {
        self.timer.cancel();
        self.buffer = None;
        self.set_state(ScanState::Idle);
    }

    /// Hand the captured characters to the decoder
    fn complete(&mut self) {
        let raw: String = self.buffer.take().unwrap_or_default().into_iter().collect();

        if self.settings.debug {
            debug!("scan complete: {} characters", raw.chars().count());
        }
        if let Some(hook) = self.callbacks.raw_data.as_mut() {
            hook(&raw);
        }

        self.decode(&raw);
    }

    fn emit(&mut self, event: SwipeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::BuiltinParser;
    use crate::swipe::test_helpers::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn visa_swipe_end_to_end() {
        let mut detector = detector_with(SwipeConfig {
            parsers: vec!["visa".to_string()],
            ..SwipeConfig::default()
        });
        let events = detector.subscribe();

        let (first, rest) = VISA_SWIPE.split_at(1);
        feed(&mut detector, first);
        assert_eq!(detector.state(), ScanState::Pending);
        feed(&mut detector, &rest[..1]);
        assert_eq!(detector.state(), ScanState::Reading);

        let keys = feed(&mut detector, &rest[1..]);
        assert!(keys.iter().all(|k| k.is_handled()));
        assert_eq!(detector.state(), ScanState::Idle);
        assert!(!detector.is_timer_pending());

        let events = drain(&events);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], SwipeEvent::ScanStart);
        assert_eq!(events[1], SwipeEvent::ScanEnd);
        match &events[2] {
            SwipeEvent::Success(CardRecord::Visa(account)) => {
                assert_eq!(account.account, "4111111111111111");
                assert_eq!(account.last_name, "DOE");
                assert_eq!(account.first_name, "JOHN");
                assert_eq!(account.exp_year, "25");
                assert_eq!(account.exp_month, "12");
            }
            other => panic!("expected visa success, got {:?}", other),
        }
    }

    #[test]
    fn every_swipe_keystroke_is_suppressed() {
        let mut detector = detector_with(SwipeConfig::default());
        let keys = feed(&mut detector, VISA_SWIPE);
        assert!(keys.iter().all(|k| k.is_handled()));
        assert_eq!(detector.stats().suppressed, VISA_SWIPE.chars().count() as u64);
    }

    #[test]
    fn luhn_failure_is_not_a_false_positive() {
        let mut detector = detector_with(SwipeConfig {
            parsers: BuiltinParser::all().iter().map(|p| p.name().to_string()).collect(),
            ..SwipeConfig::default()
        });
        let events = detector.subscribe();

        feed(&mut detector, "%B0000000000000000^A/B^0101\r");

        let events = drain(&events);
        assert_eq!(
            events,
            vec![SwipeEvent::ScanStart, SwipeEvent::ScanEnd, SwipeEvent::Failure]
        );
        assert_eq!(detector.stats().failed, 1);
    }

    #[test]
    fn typing_passes_through() {
        let mut detector = detector_with(SwipeConfig::default());
        let events = detector.subscribe();

        let keys = feed(&mut detector, "HELLO");
        assert!(keys.iter().all(|k| !k.is_handled()));
        assert_eq!(detector.state(), ScanState::Idle);
        assert!(!detector.is_timer_pending());
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn percent_then_digit_is_passed_through() {
        let mut detector = detector_with(SwipeConfig::default());
        let keys = feed(&mut detector, "%5");

        assert!(keys[0].is_handled());
        assert!(!keys[1].is_handled());
        assert_eq!(detector.state(), ScanState::Idle);
        assert_eq!(detector.buffered_len(), 0);
        assert!(!detector.is_timer_pending());
        assert_eq!(detector.stats().abandoned, 1);
    }

    #[test]
    fn lowercase_format_code_starts_reading() {
        let mut detector = detector_with(SwipeConfig::default());
        feed(&mut detector, "%b");
        assert_eq!(detector.state(), ScanState::Reading);
        assert_eq!(detector.buffered_len(), 2);
    }

    #[test]
    fn pending_timeout_returns_to_idle_silently() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .on_raw_data(move |raw| seen.borrow_mut().push(raw.to_string()))
            .build()
            .expect("detector");
        let events = detector.subscribe();

        feed(&mut detector, "%");
        assert_eq!(detector.state(), ScanState::Pending);
        assert!(!detector.poll(Instant::now()));

        assert!(expire(&mut detector));
        assert_eq!(detector.state(), ScanState::Idle);
        assert_eq!(detector.buffered_len(), 0);
        assert!(drain(&events).is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn reading_timeout_decodes_without_cr() {
        let raws = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&raws);
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .on_raw_data(move |raw| seen.borrow_mut().push(raw.to_string()))
            .build()
            .expect("detector");
        let events = detector.subscribe();

        feed(&mut detector, "%TRACK ONE?");
        assert!(expire(&mut detector));

        assert_eq!(raws.borrow().as_slice(), ["%TRACK ONE?".to_string()]);
        assert_eq!(detector.state(), ScanState::Idle);

        let events = drain(&events);
        assert_eq!(events.first(), Some(&SwipeEvent::ScanStart));
        assert!(matches!(events[1], SwipeEvent::Success(CardRecord::Generic { .. })));
        assert_eq!(events.last(), Some(&SwipeEvent::ScanEnd));
    }

    #[test]
    fn stale_timeout_is_ignored() {
        let mut detector = detector_with(SwipeConfig::default());
        let events = detector.subscribe();
        feed(&mut detector, "%B");
        feed(&mut detector, "\r");
        drain(&events);

        detector.on_timeout();
        assert!(drain(&events).is_empty());
    }

    #[test]
    fn first_line_only_decodes_at_end_sentinel_and_discards() {
        let raws = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&raws);
        let mut detector = SwipeDetector::builder(SwipeConfig {
            first_line_only: true,
            ..SwipeConfig::default()
        })
        .on_raw_data(move |raw| seen.borrow_mut().push(raw.to_string()))
        .build()
        .expect("detector");
        let events = detector.subscribe();

        feed(&mut detector, "%B123^X/Y^9912?");
        assert_eq!(detector.state(), ScanState::Discard);
        assert!(detector.is_timer_pending());
        assert_eq!(raws.borrow().as_slice(), ["%B123^X/Y^9912?".to_string()]);

        let keys = feed(&mut detector, ";123=456?\r");
        assert!(keys.iter().all(|k| k.is_handled()));
        assert_eq!(detector.state(), ScanState::Idle);
        assert!(!detector.is_timer_pending());
        assert_eq!(raws.borrow().len(), 1);

        let events = drain(&events);
        assert_eq!(events[0], SwipeEvent::ScanStart);
        assert_eq!(events[1], SwipeEvent::ScanEnd);
        assert!(matches!(events[2], SwipeEvent::Success(_)));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn question_mark_without_first_line_only_keeps_reading() {
        let mut detector = detector_with(SwipeConfig::default());
        feed(&mut detector, "%B1?;2");
        assert_eq!(detector.state(), ScanState::Reading);
    }

    #[test]
    fn discard_timeout_returns_to_idle() {
        let mut detector = detector_with(SwipeConfig {
            first_line_only: true,
            ..SwipeConfig::default()
        });
        feed(&mut detector, "%A?");
        assert_eq!(detector.state(), ScanState::Discard);
        assert!(expire(&mut detector));
        assert_eq!(detector.state(), ScanState::Idle);
    }

    #[test]
    fn prefix_then_swipe() {
        let mut detector = detector_with(SwipeConfig {
            prefix_character: Some("~".to_string()),
            ..SwipeConfig::default()
        });
        let events = detector.subscribe();

        let keys = feed(&mut detector, "~xx%ABC?\r");
        assert!(keys.iter().all(|k| k.is_handled()));
        assert_eq!(detector.state(), ScanState::Idle);

        let events = drain(&events);
        assert!(matches!(
            &events[2],
            SwipeEvent::Success(CardRecord::Generic { line1, .. }) if line1 == "ABC"
        ));
    }

    #[test]
    fn doubled_prefix_passes_through() {
        let mut detector = detector_with(SwipeConfig {
            prefix_character: Some("~".to_string()),
            ..SwipeConfig::default()
        });

        let keys = feed(&mut detector, "~~");
        assert!(keys[0].is_handled());
        assert!(!keys[1].is_handled());
        assert_eq!(detector.state(), ScanState::Idle);
        assert!(!detector.is_timer_pending());
    }

    #[test]
    fn prefix_timeout_is_abandoned() {
        let mut detector = detector_with(SwipeConfig {
            prefix_character: Some("~".to_string()),
            ..SwipeConfig::default()
        });
        feed(&mut detector, "~ab");
        assert_eq!(detector.state(), ScanState::Prefix);
        assert!(expire(&mut detector));
        assert_eq!(detector.state(), ScanState::Idle);
        assert_eq!(detector.stats().abandoned, 1);
    }

    #[test]
    fn accepted_keystrokes_reschedule_the_timer() {
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .build_with(ManualScheduler::default())
            .expect("detector");

        feed(&mut detector, "%B12");
        assert_eq!(detector.timer.scheduled, 4);
        assert!(detector.timer.pending);

        feed(&mut detector, "\r");
        assert_eq!(detector.timer.scheduled, 4);
        assert!(!detector.timer.pending);

        feed(&mut detector, "typing");
        assert_eq!(detector.timer.scheduled, 4);
    }

    #[test]
    fn custom_scheduler_expiry_decodes() {
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .build_with(ManualScheduler::default())
            .expect("detector");
        let events = detector.subscribe();

        feed(&mut detector, "%Z?");
        detector.on_timeout();

        assert!(!detector.timer.pending);
        assert!(drain(&events).contains(&SwipeEvent::Success(CardRecord::Generic {
            line1: "Z".to_string(),
            line2: String::new(),
            line3: String::new(),
        })));
    }

    #[test]
    fn release_focus_fires_on_format_code() {
        let released = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&released);
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .on_release_focus(move || *counter.borrow_mut() += 1)
            .build()
            .expect("detector");

        feed(&mut detector, "%");
        assert_eq!(*released.borrow(), 0);
        feed(&mut detector, "B1234");
        assert_eq!(*released.borrow(), 1);
    }

    #[test]
    fn complete_and_error_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::clone(&log);
        let failed = Rc::clone(&log);
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .on_complete(move |record| completed.borrow_mut().push(format!("ok {}", record.kind())))
            .on_error(move |raw| failed.borrow_mut().push(format!("err {}", raw)))
            .build()
            .expect("detector");

        feed(&mut detector, "%ABC?\r");
        feed(&mut detector, "%ABC\r");

        assert_eq!(
            log.borrow().as_slice(),
            ["ok generic".to_string(), "err %ABC\r".to_string()]
        );
    }

    #[test]
    fn direct_decode_skips_scan_events() {
        let mut detector = detector_with(SwipeConfig::default());
        let events = detector.subscribe();

        let record = detector.decode("%LINE?;1=2?");
        assert!(record.is_some());
        assert!(detector.decode("nothing").is_none());

        let events = drain(&events);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SwipeEvent::Success(_)));
        assert_eq!(events[1], SwipeEvent::Failure);
        assert_eq!(detector.stats().scans_started, 0);
    }

    #[test]
    fn disabled_detector_ignores_keystrokes() {
        let mut detector = detector_with(SwipeConfig {
            enabled: false,
            ..SwipeConfig::default()
        });
        assert!(!detector.is_enabled());

        let keys = feed(&mut detector, VISA_SWIPE);
        assert!(keys.iter().all(|k| !k.is_handled()));
        assert_eq!(detector.stats().keystrokes, 0);

        detector.enable();
        let keys = feed(&mut detector, VISA_SWIPE);
        assert!(keys.iter().all(|k| k.is_handled()));
    }

    #[test]
    fn disable_mid_swipe_drops_the_attempt() {
        let mut detector = detector_with(SwipeConfig::default());
        let events = detector.subscribe();

        feed(&mut detector, "%B41");
        detector.disable();

        assert_eq!(detector.state(), ScanState::Idle);
        assert_eq!(detector.buffered_len(), 0);
        assert!(!detector.is_timer_pending());
        assert_eq!(drain(&events), vec![SwipeEvent::ScanStart, SwipeEvent::ScanEnd]);
    }

    #[test]
    fn builder_rejects_bad_configuration() {
        let prefix = SwipeDetector::new(&SwipeConfig {
            prefix_character: Some("ab".to_string()),
            ..SwipeConfig::default()
        });
        assert!(matches!(prefix, Err(SwipeError::InvalidPrefix(_))));

        let parser = SwipeDetector::new(&SwipeConfig {
            parsers: vec!["generic".to_string(), "diners".to_string()],
            ..SwipeConfig::default()
        });
        assert!(matches!(parser, Err(SwipeError::UnknownParser(name)) if name == "diners"));
    }

    #[test]
    fn builder_parser_list_overrides_names() {
        let detector = SwipeDetector::builder(SwipeConfig::default())
            .parsers(vec![
                ParserRef::custom("loyalty", |_| None),
                BuiltinParser::Amex.into(),
            ])
            .build()
            .expect("detector");
        assert_eq!(detector.parser_names().collect::<Vec<_>>(), vec!["loyalty", "amex"]);
    }

    #[test]
    fn reconfigure_keeps_custom_parsers() {
        let mut detector = SwipeDetector::builder(SwipeConfig::default())
            .custom_parser(CustomParser::new("always", |_| {
                Some(CardRecord::Custom {
                    parser: "always".to_string(),
                    fields: Default::default(),
                })
            }))
            .build()
            .expect("detector");

        detector
            .reconfigure(&SwipeConfig {
                parsers: vec!["always".to_string()],
                interdigit_timeout_ms: 100,
                ..SwipeConfig::default()
            })
            .expect("reconfigured");

        assert_eq!(detector.interdigit_timeout(), Duration::from_millis(100));
        assert_eq!(detector.decode("anything").map(|r| r.kind().to_string()), Some("always".to_string()));

        let bad = detector.reconfigure(&SwipeConfig {
            interdigit_timeout_ms: 0,
            ..SwipeConfig::default()
        });
        assert!(matches!(bad, Err(SwipeError::InvalidTimeout)));
        assert_eq!(detector.interdigit_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn operations_by_name() {
        let mut detector = detector_with(SwipeConfig::default());

        detector.apply(Operation::parse("disable", None).expect("op")).expect("apply");
        assert!(!detector.is_enabled());
        detector.apply(Operation::parse("enable", None).expect("op")).expect("apply");
        assert!(detector.is_enabled());

        let record = detector
            .apply(Operation::parse("decode", Some("%HI?")).expect("op"))
            .expect("apply");
        assert_eq!(record.map(|r| r.kind().to_string()), Some("generic".to_string()));

        let err = Operation::parse("selfDestruct", None).unwrap_err();
        assert!(matches!(err, SwipeError::UnknownOperation(name) if name == "selfDestruct"));
    }

    #[test]
    fn decode_operation_needs_raw_data() {
        let mut detector = detector_with(SwipeConfig::default());
        let events = detector.subscribe();

        let err = Operation::parse("decode", None).unwrap_err();
        assert!(matches!(err, SwipeError::MissingArgument(name) if name == "decode"));
        assert!(drain(&events).is_empty());
        assert_eq!(detector.stats().failed, 0);

        // An explicit empty string is still a decode request
        assert_eq!(
            Operation::parse("decode", Some("")).expect("op"),
            Operation::Decode(String::new())
        );
    }

    #[test]
    fn independent_detectors_do_not_share_state() {
        let mut a = detector_with(SwipeConfig::default());
        let mut b = detector_with(SwipeConfig::default());

        feed(&mut a, "%B");
        assert_eq!(a.state(), ScanState::Reading);
        assert_eq!(b.state(), ScanState::Idle);

        let keys = feed(&mut b, "hi");
        assert!(keys.iter().all(|k| !k.is_handled()));
        assert_eq!(a.buffered_len(), 2);
    }

    #[test]
    fn dropped_subscriber_is_removed() {
        let mut detector = detector_with(SwipeConfig::default());
        let kept = detector.subscribe();
        drop(detector.subscribe());

        feed(&mut detector, "%X?\r");
        assert_eq!(detector.subscribers.len(), 1);
        assert_eq!(drain(&kept).len(), 3);
    }
}
