//! Unit tests for error.rs
//!
//! Tests Error variants, Display messages and the engine_err!/engine_bail! macros.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("device lost".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("device lost"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Entry 12 out of range".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Entry 12 out of range"));
}

#[test]
fn test_configuration_error_display() {
    let err = Error::ConfigurationError("arity must be 1..=4".to_string());
    assert_eq!(format!("{}", err), "Configuration error: arity must be 1..=4");
}

#[test]
fn test_mode_error_display() {
    let err = Error::ModeError("not a lookup texture".to_string());
    assert_eq!(format!("{}", err), "Mode error: not a lookup texture");
}

#[test]
fn test_attribute_not_found_display() {
    let err = Error::AttributeNotFound("offset".to_string());
    assert_eq!(format!("{}", err), "Attribute not found: 'offset'");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no device".to_string());
    assert!(format!("{}", err).starts_with("Initialization failed"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    assert!(format!("{:?}", Error::ModeError("x".to_string())).contains("ModeError"));
    assert!(format!("{:?}", Error::AttributeNotFound("x".to_string())).contains("AttributeNotFound"));
    assert!(format!("{:?}", Error::OutOfMemory).contains("OutOfMemory"));
}

#[test]
fn test_error_clone() {
    let err = Error::ConfigurationError("bad".to_string());
    let cloned = err.clone();
    assert_eq!(format!("{}", err), format!("{}", cloned));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

fn bail_if_negative(value: i32) -> Result<i32> {
    if value < 0 {
        crate::engine_bail!("gpu_mirror::tests", "Negative value {}", value);
    }
    Ok(value)
}

fn bail_with_variant() -> Result<()> {
    crate::engine_bail!("gpu_mirror::tests", ModeError; "Wrong mode for {}", "colors");
}

#[test]
fn test_engine_err_defaults_to_invalid_resource() {
    let err = crate::engine_err!("gpu_mirror::tests", "Slot {} unknown", 7);
    match err {
        Error::InvalidResource(msg) => assert_eq!(msg, "Slot 7 unknown"),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_engine_err_with_variant() {
    let err = crate::engine_err!("gpu_mirror::tests", ConfigurationError; "Arity {}", 5);
    assert!(matches!(err, Error::ConfigurationError(ref msg) if msg == "Arity 5"));
}

#[test]
fn test_engine_bail_returns_early() {
    assert_eq!(bail_if_negative(3).unwrap(), 3);
    assert!(matches!(bail_if_negative(-1), Err(Error::InvalidResource(_))));
}

#[test]
fn test_engine_bail_with_variant() {
    match bail_with_variant() {
        Err(Error::ModeError(msg)) => assert_eq!(msg, "Wrong mode for colors"),
        other => panic!("unexpected result: {:?}", other),
    }
}
