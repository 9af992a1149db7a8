//! Message-severity logging contract used by the plant.
//!
//! The core only talks to the [`Logger`] trait. Every state transition is
//! reported at [`Severity::Info`], suspicious-but-harmless conditions at
//! [`Severity::Warn`], and every rejected mutation at [`Severity::Error`].
//! Implementations must never panic or block the tick loop.

use std::sync::Mutex;

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Verbosity selected in the simulation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LogLevel {
    /// Everything, including per-transition Info messages.
    Verbose,
    /// Warnings and errors only.
    #[default]
    Standard,
}

impl LogLevel {
    /// Whether a message of the given severity passes this verbosity.
    pub fn allows(self, severity: Severity) -> bool {
        match self {
            LogLevel::Verbose => true,
            LogLevel::Standard => severity >= Severity::Warn,
        }
    }
}

/// Sink for plant log messages. `source` names the emitting operation,
/// e.g. `"Bath:set_status"`.
pub trait Logger: std::fmt::Debug + Send + Sync {
    fn log(&self, source: &str, message: &str, severity: Severity);
}

// ---------------------------------------------------------------------------
// tracing-backed logger
// ---------------------------------------------------------------------------

/// Forwards messages to the `tracing` macros, filtered by [`LogLevel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger {
    level: LogLevel,
}

impl TracingLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Logger for TracingLogger {
    fn log(&self, source: &str, message: &str, severity: Severity) {
        if !self.level.allows(severity) {
            return;
        }
        match severity {
            Severity::Info => tracing::info!(source = %source, "{message}"),
            Severity::Warn => tracing::warn!(source = %source, "{message}"),
            Severity::Error => tracing::error!(source = %source, "{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recording logger
// ---------------------------------------------------------------------------

/// A single captured log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub source: String,
    pub message: String,
    pub severity: Severity,
}

/// Captures every message in memory. Used by tests and observers that want
/// to inspect what the plant reported.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Records at exactly the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.severity == severity)
            .collect()
    }

    /// Number of Error records captured.
    pub fn error_count(&self) -> usize {
        self.with_severity(Severity::Error).len()
    }

    pub fn clear(&self) {
        match self.records.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Logger for RecordingLogger {
    fn log(&self, source: &str, message: &str, severity: Severity) {
        let record = LogRecord {
            source: source.to_string(),
            message: message.to_string(),
            severity,
        };
        // A poisoned lock still holds usable data; never panic from the logger.
        match self.records.lock() {
            Ok(mut guard) => guard.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _source: &str, _message: &str, _severity: Severity) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_level_hides_info() {
        assert!(!LogLevel::Standard.allows(Severity::Info));
        assert!(LogLevel::Standard.allows(Severity::Warn));
        assert!(LogLevel::Standard.allows(Severity::Error));
        assert!(LogLevel::Verbose.allows(Severity::Info));
    }

    #[test]
    fn recording_logger_captures_in_order() {
        let logger = RecordingLogger::new();
        logger.log("Bath:set_status", "first", Severity::Info);
        logger.log("Plant:transfer", "second", Severity::Error);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].source, "Plant:transfer");
        assert_eq!(logger.error_count(), 1);

        logger.clear();
        assert!(logger.records().is_empty());
    }

    #[test]
    fn tracing_logger_without_subscriber_is_silent() {
        // No subscriber installed: must simply not panic.
        TracingLogger::new(LogLevel::Verbose).log("test", "hello", Severity::Error);
    }
}
