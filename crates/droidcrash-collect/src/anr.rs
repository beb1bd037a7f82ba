//! ANR trace collection
//!
//! The ANR trace file records thread state when the foreground application
//! stops responding. It is captured into the upload directory as
//! `traces.txt` and then emptied on the device, so each pass only sees
//! traces produced since the previous one.

use std::path::PathBuf;

use droidcrash_core::domain::DevicePath;
use droidcrash_core::ports::{ModeOptions, RemoveOptions};
use tracing::{debug, info, warn};

use crate::context::CollectorContext;
use crate::error::CollectError;

/// Name of the trace copy in the upload directory
pub const TRACES_UPLOAD_NAME: &str = "traces.txt";

/// Captures and clears the device ANR trace file
#[derive(Debug, Clone)]
pub struct AnrCollector {
    ctx: CollectorContext,
    traces: DevicePath,
}

impl AnrCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            ctx,
            traces: DevicePath::anr_traces(),
        }
    }

    /// Device path of the trace file
    pub fn traces_path(&self) -> &DevicePath {
        &self.traces
    }

    /// Empty the trace file, leaving it world writable
    ///
    /// Best-effort: failures are logged and swallowed.
    pub fn clear_anr_traces(&self) {
        let _guard = self.ctx.span().enter();

        if let Err(e) = self.reset_traces() {
            warn!(path = %self.traces, error = %e, "Could not initialize ANR traces");
        }
    }

    /// Copy the trace file to the upload directory, then clear it
    ///
    /// Returns the host path of the copy when one was made. The device copy
    /// is only cleared after the host copy succeeded.
    pub fn check_anr_traces(&self) -> Option<PathBuf> {
        let _guard = self.ctx.span().enter();

        match self.ctx.device().exists(&self.traces, self.ctx.root()) {
            Ok(true) => {}
            Ok(false) => {
                info!(path = %self.traces, "ANR traces not found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.traces, error = %e, "Error checking for ANR traces");
                return None;
            }
        }

        match self.capture_traces() {
            Ok(copy) => {
                self.clear_anr_traces();
                Some(copy)
            }
            Err(e) => {
                warn!(path = %self.traces, error = %e, "Error pulling ANR traces");
                None
            }
        }
    }

    fn reset_traces(&self) -> Result<(), CollectError> {
        let device = self.ctx.device();
        let root = self.ctx.root();

        device
            .remove(&self.traces, RemoveOptions::FORCE, root)
            .map_err(|e| CollectError::device("remove", &self.traces, e))?;
        device
            .shell(&format!("echo > {}", self.traces.shell_arg()), root)
            .map_err(|e| CollectError::device("recreate", &self.traces, e))?;
        device
            .set_mode(&self.traces, ModeOptions::permissive_file(), root)
            .map_err(|e| CollectError::device("chmod", &self.traces, e))?;

        debug!(path = %self.traces, "ANR traces reset");
        Ok(())
    }

    fn capture_traces(&self) -> Result<PathBuf, CollectError> {
        let contents = self
            .ctx
            .device()
            .shell(&format!("cat {}", self.traces.shell_arg()), self.ctx.root())
            .map_err(|e| CollectError::device("read", &self.traces, e))?;

        info!("Contents of {}:", self.traces);
        info!("{}", contents);

        let copy = self.ctx.upload_dir().join(TRACES_UPLOAD_NAME);
        std::fs::write(&copy, contents.as_bytes())
            .map_err(|e| CollectError::io("write", &copy, e))?;

        Ok(copy)
    }
}
