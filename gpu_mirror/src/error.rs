//! Error types for GPU Mirror
//!
//! This module defines the single error type shared by the graphics device
//! layer, the dynamic buffers and the engine singleton, along with the
//! `engine_err!` / `engine_bail!` helpers that log an error as it is built.

use std::fmt;

/// Result type for GPU Mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// GPU Mirror errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device failure, poisoned device lock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (bad index, size mismatch, unknown slot, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, graphics device)
    InitializationFailed(String),

    /// Unsupported combination of element type, arity and backing mode
    ConfigurationError(String),

    /// Operation not available for the buffer's backing mode
    ModeError(String),

    /// Shader attribute looked up by name does not exist in the program
    AttributeNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            Error::ModeError(msg) => write!(f, "Mode error: {}", msg),
            Error::AttributeNotFound(name) => write!(f, "Attribute not found: '{}'", name),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an [`Error`], logging it at ERROR severity with file:line
///
/// The variant defaults to `InvalidResource`. Any single-`String` variant
/// can be selected by naming it before a `;`.
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("gpu_mirror::DynamicBuffer", "Entry {} out of range", index);
/// let err = engine_err!("gpu_mirror::DynamicBuffer", ModeError; "Not a texture buffer");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident; $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::mirror::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_err!($source, InvalidResource; $($arg)*)
    };
}

/// Log an error and return it from the current function
///
/// Same arguments as [`engine_err!`].
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
