//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, the built-in loggers and the macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, NullLogger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Logger that captures entries for verification
struct CaptureLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl CaptureLogger {
    fn new() -> Arc<Self> {
        Arc::new(Self { entries: Mutex::new(Vec::new()) })
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Info), "Info");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_clone() {
    let entry1 = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "test".to_string(),
        message: "warning".to_string(),
        file: Some("test.rs"),
        line: Some(10),
    };

    let entry2 = entry1.clone();

    assert_eq!(entry1.severity, entry2.severity);
    assert_eq!(entry1.source, entry2.source);
    assert_eq!(entry1.message, entry2.message);
    assert_eq!(entry1.file, entry2.file);
    assert_eq!(entry1.line, entry2.line);
}

// ============================================================================
// BUILT-IN LOGGERS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: "galaxy3d::test".to_string(),
            message: format!("{:?} message", severity),
            file: None,
            line: None,
        });
    }
}

#[test]
fn test_default_logger_error_with_file_line() {
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "galaxy3d::test".to_string(),
        message: "Error with location".to_string(),
        file: Some("texture.rs"),
        line: Some(123),
    });
}

#[test]
fn test_null_logger_accepts_entries() {
    let logger: Arc<dyn Logger> = Arc::new(NullLogger);
    crate::engine_info!(logger, "galaxy3d::test", "ignored {}", 1);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<NullLogger>();
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_info_macro_formats_message() {
    let capture = CaptureLogger::new();
    let logger: Arc<dyn Logger> = capture.clone();

    crate::engine_info!(logger, "galaxy3d::ResourceManager", "Adding Mesh '{}'", "quad");

    let entries = capture.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "galaxy3d::ResourceManager");
    assert_eq!(entries[0].message, "Adding Mesh 'quad'");
    assert!(entries[0].file.is_none());
    assert!(entries[0].line.is_none());
}

#[test]
fn test_error_macro_attaches_location() {
    let capture = CaptureLogger::new();
    let logger: Arc<dyn Logger> = capture.clone();

    crate::engine_error!(logger, "galaxy3d::test", "failed: {}", "reason");

    let entries = capture.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].message, "failed: reason");
    assert!(entries[0].file.unwrap().ends_with("log_tests.rs"));
    assert!(entries[0].line.is_some());
}

#[test]
fn test_severity_macros_map_to_levels() {
    let capture = CaptureLogger::new();
    let logger: Arc<dyn Logger> = capture.clone();

    crate::engine_trace!(logger, "s", "t");
    crate::engine_debug!(logger, "s", "d");
    crate::engine_warn!(logger, "s", "w");

    let severities: Vec<LogSeverity> = capture.entries.lock().unwrap()
        .iter()
        .map(|e| e.severity)
        .collect();
    assert_eq!(severities, vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Warn]);
}
