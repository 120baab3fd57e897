//! Unit tests for log.rs
//!
//! Tests LogSeverity, LogEntry, DefaultLogger formatting and custom loggers.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::time::SystemTime;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn entry(severity: LogSeverity, message: &str) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "gpu_mirror::DynamicBuffer".to_string(),
        message: message.to_string(),
        file: None,
        line: None,
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
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Info.label(), "INFO ");
    assert_eq!(LogSeverity::Error.label(), "ERROR");
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_with_file_line() {
    let entry = LogEntry {
        file: Some("dynamic_buffer.rs"),
        line: Some(42),
        ..entry(LogSeverity::Error, "Entry 9 out of range")
    };

    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.file, Some("dynamic_buffer.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let entry1 = entry(LogSeverity::Warn, "warning");
    let entry2 = entry1.clone();

    assert_eq!(entry1.severity, entry2.severity);
    assert_eq!(entry1.source, entry2.source);
    assert_eq!(entry1.message, entry2.message);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, "Created 'offsets'"));

    assert!(line.ends_with("[INFO ] [gpu_mirror::DynamicBuffer] Created 'offsets'"));
    assert!(!line.contains(".rs:"));
}

#[test]
fn test_format_plain_with_location() {
    let entry = LogEntry {
        file: Some("headless.rs"),
        line: Some(123),
        ..entry(LogSeverity::Error, "Allocation too large")
    };

    let line = DefaultLogger::format_plain(&entry);
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("Allocation too large (headless.rs:123)"));
}

#[test]
fn test_format_plain_starts_with_timestamp() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Debug, "x"));

    // [YYYY-MM-DD HH:MM:SS.mmm]
    assert!(line.starts_with('['));
    assert_eq!(&line[24..25], "]");
}

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Trace);
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, "message"));
        logger.log(&LogEntry {
            file: Some("test.rs"),
            line: Some(1),
            ..entry(severity, "message with location")
        });
    }
}

#[test]
fn test_default_logger_skips_trace_and_debug() {
    let logger = DefaultLogger::new();

    assert_eq!(logger.min_severity(), LogSeverity::Info);
    assert!(!logger.enabled(LogSeverity::Trace));
    assert!(!logger.enabled(LogSeverity::Debug));
    assert!(logger.enabled(LogSeverity::Info));
    assert!(logger.enabled(LogSeverity::Error));
    assert_eq!(DefaultLogger::default().min_severity(), LogSeverity::Info);
}

#[test]
fn test_default_logger_custom_threshold() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Warn);
    assert!(!logger.enabled(LogSeverity::Info));
    assert!(logger.enabled(LogSeverity::Warn));

    let verbose = DefaultLogger::with_min_severity(LogSeverity::Trace);
    assert!(verbose.enabled(LogSeverity::Trace));
}

// ============================================================================
// LOGGER TRAIT TESTS
// ============================================================================

struct CountingLogger {
    logged_count: std::sync::Mutex<usize>,
}

impl Logger for CountingLogger {
    fn log(&self, _entry: &LogEntry) {
        *self.logged_count.lock().unwrap() += 1;
    }
}

#[test]
fn test_custom_logger_enabled_defaults_to_everything() {
    let logger = CountingLogger {
        logged_count: std::sync::Mutex::new(0),
    };
    assert!(logger.enabled(LogSeverity::Trace));
}

#[test]
fn test_custom_logger_implementation() {
    let logger = CountingLogger {
        logged_count: std::sync::Mutex::new(0),
    };

    logger.log(&entry(LogSeverity::Info, "a"));
    logger.log(&entry(LogSeverity::Info, "b"));
    assert_eq!(*logger.logged_count.lock().unwrap(), 2);
}

#[test]
fn test_logger_trait_object() {
    let logger: Box<dyn Logger> = Box::new(DefaultLogger::new());
    logger.log(&entry(LogSeverity::Trace, "through a trait object"));
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}
