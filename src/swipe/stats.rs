//! Per-detector counters
//!
//! Counts only; no card data is ever kept here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeStats {
    /// Keystrokes seen while enabled
    pub keystrokes: u64,
    /// Keystrokes swallowed by a swipe
    pub suppressed: u64,
    /// Transitions into READING
    pub scans_started: u64,
    /// Decodes that produced a record
    pub decoded: u64,
    /// Decodes where no parser matched
    pub failed: u64,
    /// Attempts dropped before READING (typing after `%`, or a timeout)
    pub abandoned: u64,
    /// Decoded records by record type
    pub by_kind: BTreeMap<String, u64>,
}

impl SwipeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_keystroke(&mut self, suppressed: bool) {
        self.keystrokes += 1;
        if suppressed {
            self.suppressed += 1;
        }
    }

    pub(crate) fn record_decoded(&mut self, kind: &str) {
        self.decoded += 1;
        *self.by_kind.entry(kind.to_string()).or_default() += 1;
    }

    /// Share of decode attempts that produced a record
    pub fn success_rate(&self) -> Option<f64> {
        let attempts = self.decoded + self.failed;
        if attempts == 0 {
            return None;
        }
        Some(self.decoded as f64 / attempts as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
