//! Error types for the collectors
//!
//! These never escape a public collector operation: each stage turns them
//! into warnings and degrades by omitting the affected evidence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while collecting crash evidence
#[derive(Debug, Error)]
pub enum CollectError {
    /// A device agent call failed
    #[error("device {op} failed for {path}: {source}")]
    Device {
        op: &'static str,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A host filesystem operation failed
    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The per-pass staging directory could not be created
    #[error("could not create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    /// A host glob pattern was rejected
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The stack walker could not be started
    #[error("failed to run {}: {source}", .binary.display())]
    SymbolicatorSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stack walker exceeded its wall-clock budget and was killed
    #[error("minidump_stackwalk timed out after {0}s")]
    SymbolicatorTimeout(u64),
}

impl CollectError {
    /// Wrap a device agent failure
    pub fn device(op: &'static str, path: impl ToString, source: anyhow::Error) -> Self {
        Self::Device {
            op,
            path: path.to_string(),
            source,
        }
    }

    /// Wrap a host I/O failure
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
