//! Error aggregation across every collection stage
//!
//! [`CrashProcessor`] owns one instance of each stage for a single device
//! and runs them in a fixed order:
//!
//! 1. Java exception scan of the event log
//! 2. ANR traces (capture, then clear)
//! 3. Tombstones (pull, clear, rename)
//! 4. Minidumps (pull, clear, analyze)
//!
//! Only stages 1 and 4 contribute reports; 2 and 3 leave their evidence in
//! the upload directory. Calls against one device must be serialized.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use droidcrash_core::config::Config;
use droidcrash_core::domain::{AppPackage, DevicePath, DomainError, ErrorReport};
use droidcrash_core::ports::{IDeviceAgent, ISymbolicator};
use tracing::{debug, info, info_span, Span};

use crate::anr::AnrCollector;
use crate::context::CollectorContext;
use crate::dumps::{DumpCollector, DumpPull, DEFAULT_MAX_DUMPS};
use crate::java_exception::JavaExceptionScanner;
use crate::stackwalk::MinidumpStackwalk;
use crate::tombstone::TombstoneCollector;

/// Per-device settings for a [`CrashProcessor`]
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Durable host directory receiving evidence copies
    pub upload_dir: PathBuf,
    /// Application package, used to locate pending crash reports
    pub package: AppPackage,
    /// Application profile on the device, if one exists
    pub profile_dir: Option<DevicePath>,
    /// Run device operations privileged
    pub root: bool,
    /// Upper bound on dumps analyzed per pass
    pub max_dumps: usize,
    /// Emit a `ProfileError` when the minidump directory is missing
    pub report_missing_crash_dir: bool,
}

impl ProcessorSettings {
    pub fn new(upload_dir: PathBuf, package: AppPackage) -> Self {
        Self {
            upload_dir,
            package,
            profile_dir: None,
            root: true,
            max_dumps: DEFAULT_MAX_DUMPS,
            report_missing_crash_dir: false,
        }
    }

    #[must_use]
    pub fn with_profile_dir(mut self, profile_dir: DevicePath) -> Self {
        self.profile_dir = Some(profile_dir);
        self
    }

    /// Settings derived from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        Ok(Self {
            upload_dir: config.crash.upload_dir.clone(),
            package: config.app_package()?,
            profile_dir: config.profile_dir()?,
            root: config.device.root,
            max_dumps: config.crash.max_dumps,
            report_missing_crash_dir: config.crash.report_missing_crash_dir,
        })
    }
}

/// Runs every collection stage against one device
#[derive(Debug, Clone)]
pub struct CrashProcessor {
    java: JavaExceptionScanner,
    anr: AnrCollector,
    tombstones: TombstoneCollector,
    dumps: DumpCollector,
    report_missing_crash_dir: bool,
    span: Span,
}

impl CrashProcessor {
    /// Build a processor whose log lines are recorded under `span`
    pub fn new(
        device: Arc<dyn IDeviceAgent>,
        symbolicator: Arc<dyn ISymbolicator>,
        settings: ProcessorSettings,
        span: Span,
    ) -> Self {
        let ctx = CollectorContext::new(device, settings.upload_dir, settings.root, span.clone());
        let pending_dir = settings.package.pending_crash_reports_dir();

        Self {
            java: JavaExceptionScanner::new(ctx.clone()),
            anr: AnrCollector::new(ctx.clone()),
            tombstones: TombstoneCollector::new(ctx.clone()),
            dumps: DumpCollector::new(
                ctx,
                symbolicator,
                settings.profile_dir.as_ref(),
                pending_dir,
            )
            .with_max_dumps(settings.max_dumps),
            report_missing_crash_dir: settings.report_missing_crash_dir,
            span,
        }
    }

    /// Build a processor from configuration, using the process-backed
    /// stack walker
    pub fn from_config(device: Arc<dyn IDeviceAgent>, config: &Config) -> Result<Self, DomainError> {
        let settings = ProcessorSettings::from_config(config)?;
        let symbolicator = match config.crash.stackwalk_timeout_secs {
            Some(secs) => MinidumpStackwalk::with_timeout(Duration::from_secs(secs)),
            None => MinidumpStackwalk::new(),
        };
        let span = info_span!(
            "crash_processor",
            serial = config.device.serial.as_deref().unwrap_or("default"),
            package = %settings.package,
        );
        Ok(Self::new(device, Arc::new(symbolicator), settings, span))
    }

    pub fn java_scanner(&self) -> &JavaExceptionScanner {
        &self.java
    }

    pub fn anr(&self) -> &AnrCollector {
        &self.anr
    }

    pub fn tombstones(&self) -> &TombstoneCollector {
        &self.tombstones
    }

    pub fn dumps(&self) -> &DumpCollector {
        &self.dumps
    }

    /// Every failure found on the device, in stage order
    ///
    /// Never fails: stages that cannot complete contribute nothing.
    pub fn collect_errors(
        &self,
        symbols_path: Option<&Path>,
        stackwalk_binary: Option<&Path>,
        clean: bool,
    ) -> Vec<ErrorReport> {
        let mut errors = Vec::new();
        if let Some(exception) = self.java.get_java_exception() {
            errors.push(exception);
        }
        errors.extend(self.get_crashes(symbols_path, stackwalk_binary, clean));

        let _guard = self.span.enter();
        info!(count = errors.len(), "Collected errors");
        errors
    }

    /// Capture ANR traces and tombstones, then analyze minidumps
    ///
    /// ANR and tombstone collection always run first, whether or not a
    /// minidump directory exists.
    pub fn get_crashes(
        &self,
        symbols_path: Option<&Path>,
        stackwalk_binary: Option<&Path>,
        clean: bool,
    ) -> Vec<ErrorReport> {
        self.anr.check_anr_traces();
        self.tombstones.check_tombstones();

        match self.dumps.pull_dumps(symbols_path, stackwalk_binary, clean) {
            DumpPull::Collected(reports) => reports,
            DumpPull::NoCrashDirectory { dir } if self.report_missing_crash_dir => {
                let dir = dir
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "None".to_string());
                vec![ErrorReport::ProfileError {
                    signature: format!("No crash directory ({dir}) found on remote device"),
                }]
            }
            DumpPull::NoCrashDirectory { .. } => Vec::new(),
        }
    }

    /// Reset device state between unrelated runs
    ///
    /// Clears ANR traces, tombstones and existing minidumps without
    /// reporting anything.
    pub fn clear_all(&self) {
        {
            let _guard = self.span.enter();
            debug!("Clearing ANR traces, tombstones and crash dumps");
        }
        self.anr.clear_anr_traces();
        self.tombstones.delete_tombstones();
        self.dumps.delete_crash_dumps();
    }
}
