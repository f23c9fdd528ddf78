//! Unit tests for error.rs

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("timeline worker exited".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("timeline worker exited"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_validation_failed_display() {
    let err = Error::ValidationFailed("buffer size is zero".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Validation failed"));
    assert!(display.contains("buffer size is zero"));
}

#[test]
fn test_unsupported_feature_display() {
    let err = Error::UnsupportedFeature("astc".to_string());
    assert_eq!(format!("{}", err), "Unsupported feature: astc");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("frames_in_flight must be at least 1".to_string());
    assert!(format!("{}", err).contains("Initialization failed"));
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
fn test_error_debug_names_variant() {
    let err = Error::InvalidResource("view of a view".to_string());
    assert!(format!("{:?}", err).contains("InvalidResource"));
}

#[test]
fn test_error_clone_keeps_message() {
    let err = Error::ValidationFailed("mip range".to_string());
    let copy = err.clone();
    assert_eq!(format!("{}", err), format!("{}", copy));
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_result_type_propagates_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert!(matches!(outer(), Err(Error::OutOfMemory)));
}
