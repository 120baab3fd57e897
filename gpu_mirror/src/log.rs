//! Internal logging system for GPU Mirror
//!
//! This module provides a small logging facade with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information for ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to redirect engine logs (file, test capture, etc.)
///
/// # Example
///
/// ```no_run
/// use gpu_mirror::mirror::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);

    /// Whether entries of `severity` are wanted
    ///
    /// Checked before a message is formatted. Defaults to every severity.
    fn enabled(&self, _severity: LogSeverity) -> bool {
        true
    }
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "gpu_mirror::DynamicBuffer")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-call chatter (uploads, binds)
    Trace,

    /// Development/debugging information
    Debug,

    /// Creation and growth reports
    Info,

    /// Potential issues
    Warn,

    /// Returned errors, with file:line details
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the default logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Default logger implementation using colored console output
///
/// Entries below `min_severity` (Info unless set otherwise) are dropped, so
/// per-upload and per-bind traces stay silent.
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Console logger printing Info and above
    pub fn new() -> Self {
        Self::with_min_severity(LogSeverity::Info)
    }

    /// Console logger printing `min_severity` and above
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Lowest severity printed
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Render an entry without colors (used by the console output and tests)
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, entry.severity.label(), entry.source, entry.message, file, line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp, entry.severity.label(), entry.source, entry.message
            ),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for DefaultLogger {
    fn enabled(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    fn log(&self, entry: &LogEntry) {
        if !self.enabled(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        if $crate::mirror::Engine::log_enabled($crate::mirror::log::LogSeverity::Trace) {
            $crate::mirror::Engine::log(
                $crate::mirror::log::LogSeverity::Trace,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        if $crate::mirror::Engine::log_enabled($crate::mirror::log::LogSeverity::Debug) {
            $crate::mirror::Engine::log(
                $crate::mirror::log::LogSeverity::Debug,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log an INFO message
///
/// # Example
///
/// ```ignore
/// engine_info!("gpu_mirror::DynamicBuffer", "Created '{}' ({} bytes)", label, size);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        if $crate::mirror::Engine::log_enabled($crate::mirror::log::LogSeverity::Info) {
            $crate::mirror::Engine::log(
                $crate::mirror::log::LogSeverity::Info,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        if $crate::mirror::Engine::log_enabled($crate::mirror::log::LogSeverity::Warn) {
            $crate::mirror::Engine::log(
                $crate::mirror::log::LogSeverity::Warn,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::mirror::Engine::log_detailed(
            $crate::mirror::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
