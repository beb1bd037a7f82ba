//! Domain types for crash evidence
//!
//! This module contains:
//! - Validated value objects for device-side paths and application packages
//! - The `ErrorReport` variants returned to callers
//! - The per-dump `StackInfo` record
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod report;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::{AppPackage, DevicePath};
pub use report::{ErrorReport, StackInfo, UNKNOWN_TOP_FRAME};
