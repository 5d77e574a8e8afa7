//! Diagnostics sinks
//!
//! The exchange engine reports human-readable outcome messages through a
//! [`DiagnosticsSink`]. Sinks are write-only; the engine never looks at
//! what they do with a message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Receiver of informational and error messages
pub trait DiagnosticsSink: Send + Sync {
    /// Record an informational message
    fn log_information(&self, message: &str);

    /// Record an error message
    fn log_error(&self, message: &str);
}

/// Forwards messages to `tracing` under the `instrulink::diagnostics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log_information(&self, message: &str) {
        tracing::info!(target: "instrulink::diagnostics", "{message}");
    }

    fn log_error(&self, message: &str) {
        tracing::error!(target: "instrulink::diagnostics", "{message}");
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn log_information(&self, _message: &str) {}

    fn log_error(&self, _message: &str) {}
}

/// Severity of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Informational
    Information,
    /// Error
    Error,
}

/// One recorded diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: DiagnosticLevel,
    /// Message text
    pub message: String,
}

/// Keeps every message in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: DiagnosticLevel, message: &str) {
        let entry = DiagnosticEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Snapshot of all entries recorded so far
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries at `level`
    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.level == level)
            .count()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticsSink for RecordingSink {
    fn log_information(&self, message: &str) {
        self.push(DiagnosticLevel::Information, message);
    }

    fn log_error(&self, message: &str) {
        self.push(DiagnosticLevel::Error, message);
    }
}
