//! Droidcrash CLI - Command-line interface for droidcrash
//!
//! Provides commands for:
//! - Collecting crash evidence and error reports from a device
//! - Resetting crash state on a device between runs
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use droidcrash_core::config::{Config, LoggingConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{clear::ClearCommand, collect::CollectCommand, config::ConfigCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "droidcrash",
    version,
    about = "Collect crash evidence from Android devices"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collect Java exceptions, ANR traces, tombstones and minidumps
    Collect(CollectCommand),
    /// Clear ANR traces, tombstones and minidumps on the device
    Clear(ClearCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Install the global subscriber; logs go to stderr so stdout stays parseable
fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    init_tracing(cli.verbose, &config.logging);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Collect(cmd) => cmd.execute(&config, format),
        Commands::Clear(cmd) => cmd.execute(&config, format),
        Commands::Config(cmd) => cmd.execute(&config_path, format),
    }
}
