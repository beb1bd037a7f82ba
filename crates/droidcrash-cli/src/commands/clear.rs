//! Clear command - Reset crash state on a device
//!
//! Removes ANR traces, tombstones and minidumps so that the next
//! `droidcrash collect` only sees crashes from the run in between.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use droidcrash_adb::AdbDevice;
use droidcrash_collect::CrashProcessor;
use droidcrash_core::config::Config;
use tracing::info;

use crate::output::{Console, OutputFormat, Status};

/// Clear crash evidence on the device
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// adb serial of the target device
    #[arg(long)]
    pub serial: Option<String>,

    /// Application profile directory on the device
    #[arg(long)]
    pub profile_dir: Option<String>,
}

impl ClearCommand {
    /// Execute the clear command
    pub fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let console = Console::new(format);

        let mut config = config.clone();
        if let Some(serial) = &self.serial {
            config.device.serial = Some(serial.clone());
        }
        if let Some(profile_dir) = &self.profile_dir {
            config.app.profile_dir = Some(profile_dir.clone());
        }

        let device = Arc::new(AdbDevice::from_config(&config.device));
        let processor = CrashProcessor::from_config(device, &config)
            .context("Invalid application settings")?;

        info!(serial = ?config.device.serial, "Clearing crash state");
        processor.clear_all();

        if format.is_json() {
            console.document(&serde_json::json!({
                "success": true,
                "serial": config.device.serial,
                "cleared": ["anr_traces", "tombstones", "minidumps"],
            }))?;
        } else {
            console.headline(Status::Clean, "Cleared ANR traces, tombstones and crash dumps");
            if processor.dumps().minidump_dir().is_none() {
                console.detail("No profile directory configured; minidumps were not touched");
            }
        }

        Ok(())
    }
}
