//! `IDeviceAgent` over the adb command line
//!
//! Every remote operation is one `adb [-s <serial>] shell <command>` call,
//! with the command passed as a single argument. Privileged commands are
//! wrapped as `su -c '<command>'`. Path tests print `1` or `0` rather than
//! relying on the exit status, which older adb versions do not forward.
//!
//! `pull` and `logcat` run as adb's own user; callers open permissions on
//! privileged paths before pulling them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use droidcrash_core::config::DeviceConfig;
use droidcrash_core::domain::DevicePath;
use droidcrash_core::ports::{IDeviceAgent, ModeOptions, RemoveOptions};
use tracing::{debug, trace};

use crate::error::AdbError;

/// A device reached through the host `adb` executable
#[derive(Debug, Clone)]
pub struct AdbDevice {
    adb_path: PathBuf,
    serial: Option<String>,
}

impl AdbDevice {
    /// Target whichever device adb picks by default
    pub fn new(adb_path: impl Into<PathBuf>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial: None,
        }
    }

    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        let device = Self::new(&config.adb_path);
        match &config.serial {
            Some(serial) if !serial.trim().is_empty() => device.with_serial(serial.trim()),
            _ => device,
        }
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb_path
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn device_args(&self) -> Vec<OsString> {
        match &self.serial {
            Some(serial) => vec!["-s".into(), serial.into()],
            None => Vec::new(),
        }
    }

    /// Arguments for running `command` in a device shell
    pub fn shell_args(&self, command: &str, root: bool) -> Vec<OsString> {
        let command = if root {
            privileged(command)
        } else {
            command.to_string()
        };
        let mut args = self.device_args();
        args.push("shell".into());
        args.push(command.into());
        args
    }

    /// Arguments for copying `remote` into host directory `local`
    pub fn pull_args(&self, remote: &DevicePath, local: &Path) -> Vec<OsString> {
        let mut args = self.device_args();
        args.push("pull".into());
        args.push(remote.as_str().into());
        args.push(local.into());
        args
    }

    /// Arguments for dumping the event log with timestamps
    pub fn logcat_args(&self) -> Vec<OsString> {
        let mut args = self.device_args();
        args.extend(["logcat", "-d", "-v", "time"].map(OsString::from));
        args
    }

    fn describe(&self, args: &[OsString]) -> String {
        std::iter::once(self.adb_path.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run adb and return its stdout with `\r\n` normalized
    fn run(&self, args: &[OsString]) -> Result<String, AdbError> {
        let command = self.describe(args);
        debug!(command = %command, "Running adb");

        let output = Command::new(&self.adb_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| AdbError::Spawn {
                adb: self.adb_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdbError::Failed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n");
        trace!(command = %command, bytes = stdout.len(), "adb finished");
        Ok(stdout)
    }

    fn shell_output(&self, command: &str, root: bool) -> Result<String, AdbError> {
        self.run(&self.shell_args(command, root))
    }

    fn test_path(&self, flag: char, path: &DevicePath, root: bool) -> Result<bool, AdbError> {
        let command = test_command(flag, path);
        let output = self.shell_output(&command, root)?;
        match output.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(AdbError::UnexpectedOutput {
                command,
                output: other.to_string(),
            }),
        }
    }

    /// Pull `remote` so that a directory's entries (or a single file) land
    /// directly in `local_dir`
    ///
    /// adb versions disagree on whether pulling a directory creates it
    /// inside the target, so the pull goes to a scratch directory first.
    fn pull_into(&self, remote: &DevicePath, local_dir: &Path) -> Result<(), AdbError> {
        let scratch = tempfile::Builder::new()
            .prefix(".droidcrash-pull-")
            .tempdir_in(local_dir)
            .map_err(|source| AdbError::Io {
                op: "create scratch directory",
                path: local_dir.to_path_buf(),
                source,
            })?;

        self.run(&self.pull_args(remote, scratch.path()))?;

        let name = remote.as_str().rsplit('/').next().unwrap_or_default();
        let pulled = scratch.path().join(name);
        if !name.is_empty() && pulled.is_file() {
            move_entry(&pulled, &local_dir.join(name))?;
        } else if !name.is_empty() && pulled.is_dir() {
            move_entries(&pulled, local_dir)?;
        } else {
            move_entries(scratch.path(), local_dir)?;
        }

        let scratch_path = scratch.path().to_path_buf();
        scratch.close().map_err(|source| AdbError::Io {
            op: "remove scratch directory",
            path: scratch_path,
            source,
        })
    }
}

/// Wrap `command` so it runs as the superuser
pub fn privileged(command: &str) -> String {
    format!("su -c '{}'", command.replace('\'', r"'\''"))
}

/// Shell command printing `1` when `test -<flag>` holds for `path`
pub fn test_command(flag: char, path: &DevicePath) -> String {
    format!("[ -{flag} {} ] && echo 1 || echo 0", path.shell_arg())
}

pub fn remove_command(path: &DevicePath, options: RemoveOptions) -> String {
    let mut command = String::from("rm");
    if options.force {
        command.push_str(" -f");
    }
    if options.recursive {
        command.push_str(" -r");
    }
    format!("{command} {}", path.shell_arg())
}

pub fn chmod_command(path: &DevicePath, options: ModeOptions) -> String {
    let recursive = if options.recursive { " -R" } else { "" };
    format!("chmod{recursive} {} {}", options.mask_octal(), path.shell_arg())
}

fn move_entry(from: &Path, to: &Path) -> Result<(), AdbError> {
    std::fs::rename(from, to).map_err(|source| AdbError::Io {
        op: "move",
        path: from.to_path_buf(),
        source,
    })
}

fn move_entries(from: &Path, to: &Path) -> Result<(), AdbError> {
    let entries = std::fs::read_dir(from).map_err(|source| AdbError::Io {
        op: "read_dir",
        path: from.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| AdbError::Io {
            op: "read_dir",
            path: from.to_path_buf(),
            source,
        })?;
        move_entry(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}

impl IDeviceAgent for AdbDevice {
    fn exists(&self, path: &DevicePath, root: bool) -> anyhow::Result<bool> {
        Ok(self.test_path('e', path, root)?)
    }

    fn is_dir(&self, path: &DevicePath, root: bool) -> anyhow::Result<bool> {
        Ok(self.test_path('d', path, root)?)
    }

    fn remove(&self, path: &DevicePath, options: RemoveOptions, root: bool) -> anyhow::Result<()> {
        self.shell_output(&remove_command(path, options), root)?;
        Ok(())
    }

    fn set_mode(&self, path: &DevicePath, options: ModeOptions, root: bool) -> anyhow::Result<()> {
        self.shell_output(&chmod_command(path, options), root)?;
        Ok(())
    }

    fn pull(&self, remote: &DevicePath, local_dir: &Path, _root: bool) -> anyhow::Result<()> {
        self.pull_into(remote, local_dir)?;
        Ok(())
    }

    fn shell(&self, command: &str, root: bool) -> anyhow::Result<String> {
        Ok(self.shell_output(command, root)?)
    }

    fn event_log(&self, _root: bool) -> anyhow::Result<Vec<String>> {
        let output = self.run(&self.logcat_args())?;
        Ok(output.lines().map(str::to_string).collect())
    }
}
