//! Error reports returned by a collection pass
//!
//! An `ErrorReport` is the normalized shape of every failure the pipeline
//! detects. `StackInfo` is the intermediate, per-dump record produced while
//! symbolicating a minidump; it is consumed immediately and never retained.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Signature used when symbolication produced no top frame.
pub const UNKNOWN_TOP_FRAME: &str = "unknown top frame";

/// A structured failure discovered on the device
///
/// Serialized with a `reason` tag so downstream result submission can
/// dispatch on it without knowing the Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum ErrorReport {
    /// An uncaught Java exception found in the device event log
    #[serde(rename = "java-exception")]
    JavaException { signature: String },

    /// The application profile is missing its crash reporting directory
    #[serde(rename = "TEST-UNEXPECTED-FAIL")]
    ProfileError { signature: String },

    /// A native process crash recovered from a minidump
    #[serde(rename = "PROCESS-CRASH")]
    ProcessCrash {
        signature: String,
        stackwalk_output: String,
        stackwalk_errors: String,
    },
}

impl ErrorReport {
    /// The short signature shared by every variant
    pub fn signature(&self) -> &str {
        match self {
            ErrorReport::JavaException { signature }
            | ErrorReport::ProfileError { signature }
            | ErrorReport::ProcessCrash { signature, .. } => signature,
        }
    }

    /// The serialized `reason` tag for this variant
    pub fn reason(&self) -> &'static str {
        match self {
            ErrorReport::JavaException { .. } => "java-exception",
            ErrorReport::ProfileError { .. } => "TEST-UNEXPECTED-FAIL",
            ErrorReport::ProcessCrash { .. } => "PROCESS-CRASH",
        }
    }
}

/// Result of symbolicating one minidump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackInfo {
    /// Host path of the staged dump
    pub dump_path: PathBuf,
    /// `@ <frame>` when a crashing frame 0 was recognized
    pub signature: Option<String>,
    /// Symbolicator stdout, when it ran
    pub stdout: Option<String>,
    /// Symbolicator stderr, kept only when stdout was negligible
    pub stderr: Option<String>,
    /// Symbolicator exit code, when it ran to completion
    pub exit_code: Option<i32>,
    /// Reasons the symbolicator could not be run or did not finish
    pub errors: Vec<String>,
    /// Host path of the sidecar `.extra` file (may not exist)
    pub extra_path: PathBuf,
}

impl StackInfo {
    /// A record for `dump_path` with nothing captured yet
    pub fn new(dump_path: PathBuf, extra_path: PathBuf) -> Self {
        Self {
            dump_path,
            extra_path,
            ..Self::default()
        }
    }
}
