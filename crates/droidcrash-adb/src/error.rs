//! Error types for the adb adapter

use std::path::PathBuf;

use thiserror::Error;

/// Errors from running `adb`
#[derive(Debug, Error)]
pub enum AdbError {
    /// The adb executable could not be started
    #[error("failed to run {}: {source}", .adb.display())]
    Spawn {
        adb: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// adb ran but reported failure
    #[error("`{command}` exited with {}: {stderr}", display_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A remote test printed something other than `0` or `1`
    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    /// Host-side handling of pulled files failed
    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_string(),
    }
}
