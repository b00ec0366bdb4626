//! Session report and export functionality
//!
//! Reports hold counters only. Account numbers, names and raw stripe data
//! never reach a report.

use crate::swipe::SwipeStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: SessionSummary,
    /// Decoded records by record type
    pub records_by_type: BTreeMap<String, u64>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
    /// Parsers in the order they were tried
    pub parsers: Vec<String>,
    /// Interdigit timeout in milliseconds
    pub interdigit_timeout_ms: u64,
}

/// Session summary statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub keystrokes: u64,
    pub keystrokes_suppressed: u64,
    pub scans_started: u64,
    pub decoded: u64,
    pub failed: u64,
    pub abandoned: u64,
    /// Decoded share of decode attempts
    pub success_rate: Option<f64>,
}

impl SessionReport {
    /// Create a new session report
    pub fn new(
        start_time: Instant,
        stats: &SwipeStats,
        parsers: Vec<String>,
        interdigit_timeout_ms: u64,
    ) -> Self {
        let now: DateTime<Utc> = Utc::now();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs: start_time.elapsed().as_secs_f64(),
                parsers,
                interdigit_timeout_ms,
            },
            summary: SessionSummary {
                keystrokes: stats.keystrokes,
                keystrokes_suppressed: stats.suppressed,
                scans_started: stats.scans_started,
                decoded: stats.decoded,
                failed: stats.failed,
                abandoned: stats.abandoned,
                success_rate: stats.success_rate(),
            },
            records_by_type: stats.by_kind.clone(),
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
