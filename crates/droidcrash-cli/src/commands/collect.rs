//! Collect command - Gather crash evidence from a device
//!
//! Provides the `droidcrash collect` CLI command which:
//! 1. Applies command-line overrides on top of the loaded configuration
//! 2. Scans the event log, captures ANR traces and tombstones
//! 3. Pulls and symbolicates minidumps
//! 4. Prints every error report in collection order
//!
//! Reports are findings, not failures: the exit status is non-zero only
//! when the command itself cannot run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use droidcrash_adb::AdbDevice;
use droidcrash_collect::CrashProcessor;
use droidcrash_core::config::Config;
use droidcrash_core::domain::ErrorReport;
use tracing::{info, warn};

use crate::output::{counted, Console, OutputFormat, Status};

/// Settings whose problems only degrade dump analysis
const ANALYSIS_TOOL_FIELDS: &[&str] = &["crash.symbols_path", "crash.stackwalk_binary"];

/// Collect error reports from the device
#[derive(Debug, Default, Args)]
pub struct CollectCommand {
    /// adb serial of the target device
    #[arg(long)]
    pub serial: Option<String>,

    /// Android package of the application under test
    #[arg(long)]
    pub package: Option<String>,

    /// Application profile directory on the device
    #[arg(long)]
    pub profile_dir: Option<String>,

    /// Host directory receiving traces, tombstones and dumps
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Symbol store for the build under test
    #[arg(long)]
    pub symbols: Option<PathBuf>,

    /// Path to the minidump_stackwalk executable
    #[arg(long)]
    pub stackwalk: Option<PathBuf>,

    /// Leave collected dumps on the device
    #[arg(long)]
    pub no_clean: bool,
}

impl CollectCommand {
    /// Execute the collect command
    pub fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let console = Console::new(format);
        let config = self.apply_overrides(config.clone());

        // Missing analysis tools still let evidence be collected; they
        // surface as errors on each crash report instead.
        let (tool_errors, errors): (Vec<_>, Vec<_>) = config
            .validate()
            .into_iter()
            .partition(|e| ANALYSIS_TOOL_FIELDS.contains(&e.field.as_str()));
        for error in &tool_errors {
            warn!(field = %error.field, "{}", error.message);
        }
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }

        std::fs::create_dir_all(&config.crash.upload_dir).with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.crash.upload_dir.display()
            )
        })?;

        let device = Arc::new(AdbDevice::from_config(&config.device));
        let processor = CrashProcessor::from_config(device, &config)
            .context("Invalid application settings")?;

        info!(
            upload_dir = %config.crash.upload_dir.display(),
            clean = config.crash.clean,
            "Collecting crash evidence"
        );

        let reports = processor.collect_errors(
            config.crash.symbols_path.as_deref(),
            config.crash.stackwalk_binary.as_deref(),
            config.crash.clean,
        );

        if format.is_json() {
            console.document(&reports_json(&reports, &config)?)?;
        } else if reports.is_empty() {
            console.headline(Status::Clean, "No errors found");
            console.detail(&format!(
                "Upload directory: {}",
                config.crash.upload_dir.display()
            ));
        } else {
            console.headline(
                Status::Findings,
                &format!("{} found", counted(reports.len(), "error")),
            );
            console.detail(&format!(
                "Upload directory: {}",
                config.crash.upload_dir.display()
            ));
            console.blank();
            for report in &reports {
                for line in report_lines(report) {
                    console.detail(&line);
                }
            }
        }

        Ok(())
    }

    /// Overlay command-line flags on `config`
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(serial) = &self.serial {
            config.device.serial = Some(serial.clone());
        }
        if let Some(package) = &self.package {
            config.app.package = package.clone();
        }
        if let Some(profile_dir) = &self.profile_dir {
            config.app.profile_dir = Some(profile_dir.clone());
        }
        if let Some(upload_dir) = &self.upload_dir {
            config.crash.upload_dir = upload_dir.clone();
        }
        if let Some(symbols) = &self.symbols {
            config.crash.symbols_path = Some(symbols.clone());
        }
        if let Some(stackwalk) = &self.stackwalk {
            config.crash.stackwalk_binary = Some(stackwalk.clone());
        }
        if self.no_clean {
            config.crash.clean = false;
        }
        config
    }
}

/// Human rendering of one report: a `reason | signature` headline, then
/// any analysis errors
fn report_lines(report: &ErrorReport) -> Vec<String> {
    let mut lines = vec![format!("{} | {}", report.reason(), report.signature())];
    if let ErrorReport::ProcessCrash {
        stackwalk_errors, ..
    } = report
    {
        lines.extend(
            stackwalk_errors
                .lines()
                .filter(|l| !l.is_empty())
                .map(|l| format!("    {l}")),
        );
    }
    lines
}

fn reports_json(reports: &[ErrorReport], config: &Config) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "collected_at": chrono::Utc::now().to_rfc3339(),
        "serial": config.device.serial,
        "package": config.app.package,
        "upload_dir": config.crash.upload_dir.display().to_string(),
        "errors": serde_json::to_value(reports).context("Failed to serialize error reports")?,
    }))
}
