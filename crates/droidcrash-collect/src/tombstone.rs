//! Native tombstone collection
//!
//! Tombstones are pulled straight into the upload directory, removed from
//! the device, and renamed with [`TombstoneNamer`] so that earlier copies
//! are never overwritten.

use std::path::{Path, PathBuf};

use droidcrash_core::domain::DevicePath;
use droidcrash_core::ports::{ModeOptions, RemoveOptions};
use tracing::{debug, info, warn};

use crate::context::CollectorContext;
use crate::error::CollectError;
use crate::namer::{TombstoneNamer, TOMBSTONE_PATTERN};

/// Pulls, clears and renames native crash tombstones
#[derive(Debug, Clone)]
pub struct TombstoneCollector {
    ctx: CollectorContext,
    tombstones: DevicePath,
}

impl TombstoneCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            ctx,
            tombstones: DevicePath::tombstones(),
        }
    }

    /// Device path of the tombstone directory
    pub fn tombstones_path(&self) -> &DevicePath {
        &self.tombstones
    }

    /// Forcibly remove the tombstone directory from the device
    pub fn delete_tombstones(&self) {
        let _guard = self.ctx.span().enter();

        if let Err(e) = self.ctx.device().remove(
            &self.tombstones,
            RemoveOptions::FORCE_RECURSIVE,
            self.ctx.root(),
        ) {
            warn!(path = %self.tombstones, error = %e, "Could not delete tombstones");
        }
    }

    /// Move any tombstones into the upload directory
    ///
    /// Returns the renamed host copies in name order. An absent tombstone
    /// directory is routine and yields an empty list.
    pub fn check_tombstones(&self) -> Vec<PathBuf> {
        let _guard = self.ctx.span().enter();

        match self.ctx.device().exists(&self.tombstones, self.ctx.root()) {
            Ok(true) => {}
            Ok(false) => {
                warn!(path = %self.tombstones, "Tombstone directory does not exist; tombstone check skipped");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.tombstones, error = %e, "Error checking for tombstones");
                return Vec::new();
            }
        }

        self.open_permissions();

        match self.pull_tombstones() {
            Ok(()) => self.delete_tombstones(),
            Err(e) => warn!(path = %self.tombstones, error = %e, "Error pulling tombstones"),
        }

        match rename_tombstones(self.ctx.upload_dir()) {
            Ok(renamed) => {
                if !renamed.is_empty() {
                    info!(count = renamed.len(), "Collected tombstones");
                }
                renamed
            }
            Err(e) => {
                warn!(error = %e, "Error renaming tombstones");
                Vec::new()
            }
        }
    }

    fn open_permissions(&self) {
        let device = self.ctx.device();
        let root = self.ctx.root();

        if let Err(e) = device.set_mode(&self.tombstones, ModeOptions::permissive(), root) {
            warn!(path = %self.tombstones, error = %e, "Could not chmod tombstone directory");
        }
        let entries = self.tombstones.contents();
        if let Err(e) = device.set_mode(&entries, ModeOptions::permissive_file(), root) {
            warn!(path = %entries, error = %e, "Could not chmod tombstones");
        }
    }

    fn pull_tombstones(&self) -> Result<(), CollectError> {
        self.ctx
            .device()
            .pull(&self.tombstones, self.ctx.upload_dir(), self.ctx.root())
            .map_err(|e| CollectError::device("pull", &self.tombstones, e))
    }
}

/// Rename every `tombstone_??` in `dir` to its first free `.<n>.txt` name
///
/// A file that cannot be renamed is logged and left in place.
pub fn rename_tombstones(dir: &Path) -> Result<Vec<PathBuf>, CollectError> {
    rename_tombstones_with(dir, |from, to| std::fs::rename(from, to))
}

fn rename_tombstones_with<F>(dir: &Path, mut rename: F) -> Result<Vec<PathBuf>, CollectError>
where
    F: FnMut(&Path, &Path) -> std::io::Result<()>,
{
    let pattern = glob::Pattern::new(TOMBSTONE_PATTERN)?;

    let mut pulled: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| CollectError::io("read_dir", dir, e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name))
        })
        .collect();
    pulled.sort();

    let mut renamed = Vec::with_capacity(pulled.len());
    for original in pulled {
        let Some(target) = TombstoneNamer::next_available(&original, |p| p.exists()) else {
            warn!(path = %original.display(), "No free name for tombstone");
            continue;
        };
        if let Err(e) = rename(&original, &target) {
            warn!(error = %CollectError::io("rename", &original, e), "Could not rename tombstone");
            continue;
        }
        debug!(path = %target.display(), "Renamed tombstone");
        renamed.push(target);
    }

    Ok(renamed)
}
