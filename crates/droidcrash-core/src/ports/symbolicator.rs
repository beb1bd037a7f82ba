//! Symbolicator port
//!
//! A native stack walker invoked as `<binary> <dumpFile> <symbolsDir>`.
//! Non-zero exit codes and stderr output both occur on partial success, so
//! the port reports them verbatim and leaves interpretation to the caller.

use std::path::Path;

/// Everything a symbolicator run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolicatorOutput {
    pub stdout: String,
    pub stderr: String,
    /// Negative signal number when the process was killed by a signal
    pub exit_code: Option<i32>,
}

/// Port trait for minidump symbolication
pub trait ISymbolicator: Send + Sync {
    /// Run `binary` against `dump` with the symbol store at `symbols`
    ///
    /// # Errors
    /// Returns an error only when the process could not be run to
    /// completion (spawn failure, timeout). A non-zero exit is not an error.
    fn run(&self, binary: &Path, dump: &Path, symbols: &Path)
        -> anyhow::Result<SymbolicatorOutput>;
}
