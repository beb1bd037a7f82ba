//! Minidump collection
//!
//! Dumps are pulled from the profile's `minidumps` directory and from the
//! crash reporter's pending directory into one private staging directory.
//! Staging lets one pass accumulate dumps from both places and process
//! each exactly once before anything reaches the shared upload directory.
//!
//! The number of dumps analyzed per pass is bounded: a crash loop can
//! leave hundreds of dumps behind and every analysis runs the stack walker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use droidcrash_core::domain::{DevicePath, ErrorReport, StackInfo, UNKNOWN_TOP_FRAME};
use droidcrash_core::ports::{ISymbolicator, ModeOptions, RemoveOptions};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::context::CollectorContext;
use crate::error::CollectError;
use crate::stackwalk::{analyze_dump, extra_path_for};

/// Dumps analyzed per pass unless configured otherwise
pub const DEFAULT_MAX_DUMPS: usize = 10;

/// Name of the minidump directory inside the profile
pub const MINIDUMPS_DIR_NAME: &str = "minidumps";

/// Outcome of [`DumpCollector::pull_dumps`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpPull {
    /// Crash reporting never created its minidump directory
    NoCrashDirectory { dir: Option<DevicePath> },
    /// Reports for every analyzed dump, in discovery order
    Collected(Vec<ErrorReport>),
}

impl DumpPull {
    /// The crash reports, empty when no crash directory was found
    pub fn into_reports(self) -> Vec<ErrorReport> {
        match self {
            DumpPull::NoCrashDirectory { .. } => Vec::new(),
            DumpPull::Collected(reports) => reports,
        }
    }
}

/// Pulls, bounds, copies and symbolicates minidumps
#[derive(Clone)]
pub struct DumpCollector {
    ctx: CollectorContext,
    symbolicator: Arc<dyn ISymbolicator>,
    minidump_dir: Option<DevicePath>,
    pending_dir: DevicePath,
    max_dumps: usize,
}

impl DumpCollector {
    /// `profile_dir` may be unset when the profile was never created.
    pub fn new(
        ctx: CollectorContext,
        symbolicator: Arc<dyn ISymbolicator>,
        profile_dir: Option<&DevicePath>,
        pending_dir: DevicePath,
    ) -> Self {
        let minidump_dir = profile_dir.and_then(|dir| dir.join(MINIDUMPS_DIR_NAME).ok());
        Self {
            ctx,
            symbolicator,
            minidump_dir,
            pending_dir,
            max_dumps: DEFAULT_MAX_DUMPS,
        }
    }

    /// Override the per-pass dump bound (at least one)
    #[must_use]
    pub fn with_max_dumps(mut self, max_dumps: usize) -> Self {
        self.max_dumps = max_dumps.max(1);
        self
    }

    /// Device path of the in-profile minidump directory
    pub fn minidump_dir(&self) -> Option<&DevicePath> {
        self.minidump_dir.as_ref()
    }

    /// Device path of the pending crash report directory
    pub fn pending_dir(&self) -> &DevicePath {
        &self.pending_dir
    }

    pub fn max_dumps(&self) -> usize {
        self.max_dumps
    }

    /// Remove every existing dump from the profile's minidump directory
    pub fn delete_crash_dumps(&self) {
        let _guard = self.ctx.span().enter();

        let Some(dir) = &self.minidump_dir else {
            debug!("No profile directory configured; skipping crash dump removal");
            return;
        };
        let entries = dir.contents();
        if let Err(e) = self.ctx.device().remove(
            &entries,
            RemoveOptions::FORCE_RECURSIVE,
            self.ctx.root(),
        ) {
            warn!(path = %entries, error = %e, "Could not delete crash dumps");
        }
    }

    /// Pull every dump from the device and turn each into a crash report
    ///
    /// With `clean`, pulled dumps are removed from the device.
    pub fn pull_dumps(
        &self,
        symbols_path: Option<&Path>,
        stackwalk_binary: Option<&Path>,
        clean: bool,
    ) -> DumpPull {
        let _guard = self.ctx.span().enter();

        let Some(dir) = self.present_minidump_dir() else {
            // The directory is created when the application first starts
            // with crash reporting enabled, so its absence is a hint that
            // something went wrong early.
            warn!(
                dir = %display_opt(self.minidump_dir.as_ref()),
                "No crash directory found on remote device"
            );
            return DumpPull::NoCrashDirectory {
                dir: self.minidump_dir.clone(),
            };
        };

        let staging = match create_staging_dir() {
            Ok(staging) => staging,
            Err(e) => {
                warn!(error = %e, "Cannot stage crash dumps");
                return DumpPull::Collected(Vec::new());
            }
        };

        self.pull_source(dir, staging.path(), clean);
        match self.ctx.device().is_dir(&self.pending_dir, self.ctx.root()) {
            Ok(true) => self.pull_source(&self.pending_dir, staging.path(), clean),
            Ok(false) => debug!(path = %self.pending_dir, "No pending crash reports"),
            Err(e) => warn!(path = %self.pending_dir, error = %e, "Error checking pending crash reports"),
        }

        let mut dumps = match find_dump_pairs(staging.path()) {
            Ok(dumps) => dumps,
            Err(e) => {
                warn!(error = %e, "Cannot list staged crash dumps");
                Vec::new()
            }
        };
        if dumps.len() > self.max_dumps {
            warn!(
                found = dumps.len(),
                limit = self.max_dumps,
                discarded = dumps.len() - self.max_dumps,
                "Found {} dump files -- limited to {}",
                dumps.len(),
                self.max_dumps
            );
            dumps.truncate(self.max_dumps);
        }
        debug!(dumps = ?dumps, "Dump files to process");

        let mut reports = Vec::with_capacity(dumps.len());
        for (dump, extra) in &dumps {
            self.copy_to_upload(dump);
            self.copy_to_upload(extra);

            let info = analyze_dump(
                self.symbolicator.as_ref(),
                dump,
                extra,
                symbols_path,
                stackwalk_binary,
            );
            let report = crash_report_from(&info);
            info!(signature = %report.signature(), "application crashed [{}]", report.signature());
            reports.push(report);
        }

        let staging_path = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            warn!(path = %staging_path.display(), error = %e, "Could not remove staging directory");
        }

        DumpPull::Collected(reports)
    }

    fn present_minidump_dir(&self) -> Option<&DevicePath> {
        let dir = self.minidump_dir.as_ref()?;
        match self.ctx.device().is_dir(dir, self.ctx.root()) {
            Ok(true) => Some(dir),
            Ok(false) => None,
            Err(e) => {
                warn!(path = %dir, error = %e, "Error checking crash directory");
                None
            }
        }
    }

    /// Open permissions on `dir`, pull it into `staging`, optionally clear it
    ///
    /// The device copy is only cleared when the pull succeeded.
    fn pull_source(&self, dir: &DevicePath, staging: &Path, clean: bool) {
        let device = self.ctx.device();
        let root = self.ctx.root();

        if let Err(e) = device.set_mode(dir, ModeOptions::permissive().recursive(), root) {
            warn!(path = %dir, error = %e, "Could not chmod crash directory");
        }
        if let Err(e) = device.pull(dir, staging, root) {
            warn!(
                error = %CollectError::device("pull", dir, e),
                "Error pulling crash dumps"
            );
            return;
        }
        if clean {
            let entries = dir.contents();
            if let Err(e) = device.remove(&entries, RemoveOptions::FORCE, root) {
                warn!(path = %entries, error = %e, "Could not clear crash directory");
            }
        }
    }

    /// Best-effort copy of a staged file into the upload directory
    fn copy_to_upload(&self, path: &Path) {
        if !path.exists() {
            return;
        }
        let Some(name) = path.file_name() else {
            return;
        };
        let target = self.ctx.upload_dir().join(name);
        if let Err(e) = std::fs::copy(path, &target) {
            warn!(
                error = %CollectError::io("copy", path, e),
                upload_dir = %self.ctx.upload_dir().display(),
                "Attempting to copy to upload directory"
            );
        }
    }
}

impl std::fmt::Debug for DumpCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpCollector")
            .field("minidump_dir", &self.minidump_dir)
            .field("pending_dir", &self.pending_dir)
            .field("max_dumps", &self.max_dumps)
            .finish_non_exhaustive()
    }
}

fn create_staging_dir() -> Result<TempDir, CollectError> {
    tempfile::Builder::new()
        .prefix("droidcrash-dumps-")
        .tempdir()
        .map_err(CollectError::Staging)
}

fn display_opt(dir: Option<&DevicePath>) -> String {
    dir.map(ToString::to_string)
        .unwrap_or_else(|| "None".to_string())
}

/// Every `*.dmp` in `dir`, paired with its same-stem `.extra` path
///
/// Pairs come back in name order. The `.extra` file need not exist.
pub fn find_dump_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, CollectError> {
    let pattern = format!("{}/*.dmp", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut pairs = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(dump) => {
                let extra = extra_path_for(&dump);
                pairs.push((dump, extra));
            }
            Err(e) => warn!(error = %e, "Unreadable staging entry"),
        }
    }
    Ok(pairs)
}

/// Normalize one symbolication result into a `ProcessCrash` report
pub fn crash_report_from(info: &StackInfo) -> ErrorReport {
    let mut output = vec![format!("Crash dump filename: {}", info.dump_path.display())];

    match (&info.stderr, &info.stdout) {
        (Some(stderr), _) if !stderr.is_empty() => {
            output.push("stderr from minidump_stackwalk:".to_string());
            output.push(stderr.clone());
        }
        (_, Some(stdout)) => output.push(stdout.clone()),
        _ => {}
    }

    if let Some(code) = info.exit_code.filter(|code| *code != 0) {
        output.push(format!("minidump_stackwalk exited with return code {code}"));
    }

    ErrorReport::ProcessCrash {
        signature: info
            .signature
            .clone()
            .unwrap_or_else(|| UNKNOWN_TOP_FRAME.to_string()),
        stackwalk_output: output.join("\n"),
        stackwalk_errors: info.errors.join("\n"),
    }
}
