//! Minidump symbolication
//!
//! [`MinidumpStackwalk`] runs the external stack walker as a child process.
//! [`analyze_dump`] checks the preconditions, runs a symbolicator against
//! one dump and condenses the result into a [`StackInfo`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use droidcrash_core::domain::StackInfo;
use droidcrash_core::ports::{ISymbolicator, SymbolicatorOutput};
use tracing::debug;

use crate::error::CollectError;
use crate::signature::extract_signature;

/// Stdout at or below this many bytes means the walker produced nothing useful.
pub const NEGLIGIBLE_STDOUT_BYTES: usize = 3;

/// How often a timed run checks whether the child has exited
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `minidump_stackwalk <dump> <symbols>` as a child process
#[derive(Debug, Clone, Default)]
pub struct MinidumpStackwalk {
    timeout: Option<Duration>,
}

impl MinidumpStackwalk {
    /// A walker that blocks until the child exits
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// A walker that kills the child after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Configured wall-clock budget, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn run_bounded(
        &self,
        binary: &Path,
        mut command: Command,
        limit: Duration,
    ) -> Result<SymbolicatorOutput, CollectError> {
        let mut child = command
            .spawn()
            .map_err(|source| CollectError::SymbolicatorSpawn {
                binary: binary.to_path_buf(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty walker cannot block on
        // a full pipe.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + limit;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CollectError::SymbolicatorTimeout(limit.as_secs()));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(CollectError::io("wait", binary, source));
                }
            }
        };

        Ok(SymbolicatorOutput {
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
            exit_code: exit_code_of(status),
        })
    }
}

impl ISymbolicator for MinidumpStackwalk {
    fn run(
        &self,
        binary: &Path,
        dump: &Path,
        symbols: &Path,
    ) -> anyhow::Result<SymbolicatorOutput> {
        let mut command = Command::new(binary);
        command
            .arg(dump)
            .arg(symbols)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(limit) = self.timeout {
            return Ok(self.run_bounded(binary, command, limit)?);
        }

        let output = command
            .output()
            .map_err(|source| CollectError::SymbolicatorSpawn {
                binary: binary.to_path_buf(),
                source,
            })?;

        Ok(SymbolicatorOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: exit_code_of(output.status),
        })
    }
}

/// Exit code of the walker, with a signal death reported as `-signo`
fn exit_code_of(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(-signal);
        }
    }
    status.code()
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(reader: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Symbolicate one dump
///
/// The walker only runs when a symbols path is given and the walker binary
/// exists; otherwise one explanatory line per missing precondition is
/// recorded in `errors`. No outcome of the walker is fatal: a missing
/// signature, non-zero exit or stderr output is recorded as-is.
pub fn analyze_dump(
    symbolicator: &dyn ISymbolicator,
    dump: &Path,
    extra: &Path,
    symbols_path: Option<&Path>,
    stackwalk_binary: Option<&Path>,
) -> StackInfo {
    debug!(
        dump = %dump.display(),
        extra = %extra.display(),
        symbols = ?symbols_path,
        stackwalk = ?stackwalk_binary,
        "Processing dump file"
    );

    let mut info = StackInfo::new(dump.to_path_buf(), extra.to_path_buf());

    let symbols = symbols_path.filter(|p| !p.as_os_str().is_empty());
    let binary = stackwalk_binary.filter(|p| !p.as_os_str().is_empty());

    match (symbols, binary) {
        (Some(symbols), Some(binary)) if binary.exists() => {
            match symbolicator.run(binary, dump, symbols) {
                Ok(output) => record_output(&mut info, output),
                Err(e) => info.errors.push(e.to_string()),
            }
        }
        _ => {
            if symbols.is_none() {
                info.errors
                    .push("No symbols path given, can't process dump.".to_string());
            }
            match binary {
                None => info
                    .errors
                    .push("MINIDUMP_STACKWALK not set, can't process dump.".to_string()),
                Some(binary) if !binary.exists() => info.errors.push(format!(
                    "MINIDUMP_STACKWALK binary not found: {}",
                    binary.display()
                )),
                Some(_) => {}
            }
        }
    }

    debug!(
        dump = %dump.display(),
        signature = ?info.signature,
        exit_code = ?info.exit_code,
        errors = ?info.errors,
        "Processed dump file"
    );

    info
}

fn record_output(info: &mut StackInfo, output: SymbolicatorOutput) {
    info.exit_code = output.exit_code;
    if output.stdout.len() > NEGLIGIBLE_STDOUT_BYTES {
        // The walker is chatty on stderr even when it succeeds.
        info.signature = extract_signature(&output.stdout);
    } else {
        info.stderr = Some(output.stderr);
    }
    info.stdout = Some(output.stdout);
}

/// Sibling `.extra` metadata path for a dump
pub fn extra_path_for(dump: &Path) -> PathBuf {
    dump.with_extension("extra")
}
