//! Domain error types
//!
//! Validation failures raised when building value objects from volatile
//! configuration fields (profile path, application package).

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Device path is empty or not absolute
    #[error("Invalid device path: {0}")]
    InvalidDevicePath(String),

    /// Path or argument carries characters the device shell would interpret
    #[error("Unsafe shell argument: {0}")]
    UnsafeShellArgument(String),

    /// Application package does not follow Java package syntax
    #[error("Invalid application package: {0}")]
    InvalidPackage(String),
}
