//! Shared collector context
//!
//! Each collector is handed its device, upload directory and logging span
//! at construction. Nothing is read from process-wide state, so several
//! processors (one per device) can coexist in one process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use droidcrash_core::ports::IDeviceAgent;
use tracing::Span;

/// Everything a collection stage needs to talk to one device
#[derive(Clone)]
pub struct CollectorContext {
    device: Arc<dyn IDeviceAgent>,
    upload_dir: PathBuf,
    root: bool,
    span: Span,
}

impl CollectorContext {
    pub fn new(device: Arc<dyn IDeviceAgent>, upload_dir: PathBuf, root: bool, span: Span) -> Self {
        Self {
            device,
            upload_dir,
            root,
            span,
        }
    }

    /// The device agent
    pub fn device(&self) -> &dyn IDeviceAgent {
        self.device.as_ref()
    }

    /// Durable host directory receiving copies of the evidence
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Whether device operations run privileged
    pub fn root(&self) -> bool {
        self.root
    }

    /// Span all log lines of this device are recorded under
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl std::fmt::Debug for CollectorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorContext")
            .field("upload_dir", &self.upload_dir)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
