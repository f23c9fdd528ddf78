//! Error types for the Prism GPU layer
//!
//! Only construction-time failures are reported through `Error`. Calling
//! frame or render-pass operations out of order is a contract violation and
//! is caught by debug assertions instead (see `command.rs`).

use std::fmt;

/// Result type for Prism GPU operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism GPU errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error
    BackendError(String),

    /// Out of GPU memory (fatal to the caller, never retried)
    OutOfMemory,

    /// Invalid resource (destroyed, wrong kind, wrong usage)
    InvalidResource(String),

    /// Device initialization failed
    InitializationFailed(String),

    /// A descriptor failed construction-time validation
    ValidationFailed(String),

    /// The descriptor needs an optional feature the device does not report
    UnsupportedFeature(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            Error::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
