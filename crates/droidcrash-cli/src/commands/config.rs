//! Config command - View and validate droidcrash configuration
//!
//! Provides the `droidcrash config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Prints where the configuration file is looked up

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use droidcrash_core::config::Config;
use tracing::info;

use crate::output::{counted, Console, OutputFormat, Status};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

/// Outcome of checking a configuration file on disk
#[derive(Debug, PartialEq)]
enum ConfigCheck {
    Missing,
    Unparsable(String),
    Checked(Vec<String>),
}

impl ConfigCommand {
    /// Execute the config command
    pub fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
            ConfigCommand::Path => execute_path(config_path, format),
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let console = Console::new(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        console.document(&json)?;
    } else {
        console.headline(Status::Clean, &format!("Configuration ({})", config_path.display()));
        console.blank();

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            console.detail(line);
        }
    }

    Ok(())
}

fn check_config_file(config_path: &Path) -> ConfigCheck {
    if !config_path.exists() {
        return ConfigCheck::Missing;
    }
    match Config::load(config_path) {
        Ok(config) => ConfigCheck::Checked(config.validate().iter().map(ToString::to_string).collect()),
        Err(e) => ConfigCheck::Unparsable(format!("Failed to parse configuration: {e}")),
    }
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let console = Console::new(format);

    info!(config_path = %config_path.display(), "Validating configuration");

    let (valid, errors) = match check_config_file(config_path) {
        ConfigCheck::Missing => {
            if !format.is_json() {
                console.detail(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                console.detail("Using default configuration.");
                return Ok(());
            }
            (
                false,
                vec!["Configuration file not found. Using defaults.".to_string()],
            )
        }
        ConfigCheck::Unparsable(message) => (false, vec![message]),
        ConfigCheck::Checked(errors) => (errors.is_empty(), errors),
    };

    if format.is_json() {
        console.document(&serde_json::json!({
            "valid": valid,
            "config_path": config_path.display().to_string(),
            "errors": errors,
        }))?;
    } else if valid {
        console.headline(Status::Clean, "Configuration is valid");
        console.detail(&format!("File: {}", config_path.display()));
    } else {
        console.headline(
            Status::Findings,
            &format!("Configuration has {}:", counted(errors.len(), "error")),
        );
        console.detail(&format!("File: {}", config_path.display()));
        console.blank();
        for error in &errors {
            console.detail(&format!("  {error}"));
        }
    }

    Ok(())
}

fn execute_path(config_path: &Path, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        Console::new(format).document(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }))?;
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}
