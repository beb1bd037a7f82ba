//! Collision-free naming for pulled tombstones
//!
//! Tombstones are recycled by the OS (`tombstone_00` .. `tombstone_09`), so
//! the same name shows up again and again across passes and devices that
//! share an upload directory. Each pulled file is renamed to
//! `<name>.<n>.txt` with the smallest `n` not already taken.

use std::path::{Path, PathBuf};

/// Host-side glob matching a freshly pulled tombstone
pub const TOMBSTONE_PATTERN: &str = "tombstone_??";

/// Generates non-overwriting names for tombstone copies
pub struct TombstoneNamer;

impl TombstoneNamer {
    /// Candidate name for suffix `n`
    pub fn candidate(original: &Path, n: u32) -> PathBuf {
        let mut name = original.as_os_str().to_os_string();
        name.push(format!(".{n}.txt"));
        PathBuf::from(name)
    }

    /// First `<original>.<n>.txt` for which `exists` is false
    ///
    /// Returns `None` only if every suffix is taken.
    pub fn next_available<F>(original: &Path, mut exists: F) -> Option<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        (1..=u32::MAX)
            .map(|n| Self::candidate(original, n))
            .find(|candidate| !exists(candidate))
    }
}
