//! Device agent port (driven/secondary port)
//!
//! The minimal set of remote operations needed to discover, extract and
//! clear crash evidence on a device.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific.
//! - Every call blocks until the device answers. There is no timeout and no
//!   retry at this layer; callers treat failures as warnings.
//! - The `root` flag asks the adapter to run the operation privileged. It is
//!   threaded through unchanged from the caller.
//! - Calls against one device must be serialized by the caller.

use std::path::Path;

use crate::domain::newtypes::DevicePath;

/// Options for [`IDeviceAgent::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOptions {
    /// Ignore nonexistent targets
    pub force: bool,
    /// Descend into directories
    pub recursive: bool,
}

impl RemoveOptions {
    /// Plain single-file remove
    pub const FILE: Self = Self {
        force: false,
        recursive: false,
    };

    /// Forced remove, not recursive
    pub const FORCE: Self = Self {
        force: true,
        recursive: false,
    };

    /// `rm -rf` semantics
    pub const FORCE_RECURSIVE: Self = Self {
        force: true,
        recursive: true,
    };
}

/// Options for [`IDeviceAgent::set_mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeOptions {
    /// Permission bits, e.g. `0o777`
    pub mask: u32,
    /// Apply to every entry below a directory
    pub recursive: bool,
}

impl ModeOptions {
    /// World read/write/execute, used on directories before pulling
    pub const fn permissive() -> Self {
        Self {
            mask: 0o777,
            recursive: false,
        }
    }

    /// World read/write, used on plain files
    pub const fn permissive_file() -> Self {
        Self {
            mask: 0o666,
            recursive: false,
        }
    }

    /// Same mask, applied recursively
    #[must_use]
    pub const fn recursive(self) -> Self {
        Self {
            mask: self.mask,
            recursive: true,
        }
    }

    /// Octal rendering for `chmod`
    pub fn mask_octal(&self) -> String {
        format!("{:o}", self.mask)
    }
}

impl Default for ModeOptions {
    fn default() -> Self {
        Self::permissive()
    }
}

/// Port trait for remote device operations
///
/// ## Implementation Notes
///
/// - `pull` of a directory copies the directory's *entries* into
///   `local_dir`, not a nested copy of the directory itself.
/// - `event_log` returns the device log as lines, oldest first.
/// - Paths that designate directory contents (`DevicePath::contents`) are
///   valid targets for `remove` and `set_mode`.
pub trait IDeviceAgent: Send + Sync {
    /// Returns true if `path` exists on the device
    fn exists(&self, path: &DevicePath, root: bool) -> anyhow::Result<bool>;

    /// Returns true if `path` exists and is a directory
    fn is_dir(&self, path: &DevicePath, root: bool) -> anyhow::Result<bool>;

    /// Removes `path` from the device
    fn remove(&self, path: &DevicePath, options: RemoveOptions, root: bool)
        -> anyhow::Result<()>;

    /// Changes the permission bits of `path`
    fn set_mode(&self, path: &DevicePath, options: ModeOptions, root: bool)
        -> anyhow::Result<()>;

    /// Copies `remote` (a file, or a directory's entries) into `local_dir`
    fn pull(&self, remote: &DevicePath, local_dir: &Path, root: bool) -> anyhow::Result<()>;

    /// Runs `command` in the device shell and returns its output
    fn shell(&self, command: &str, root: bool) -> anyhow::Result<String>;

    /// Fetches the full device event log
    fn event_log(&self, root: bool) -> anyhow::Result<Vec<String>>;
}
