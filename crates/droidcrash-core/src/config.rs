//! Configuration module for droidcrash.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{AppPackage, DevicePath};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for droidcrash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub app: AppConfig,
    pub crash: CrashConfig,
    pub logging: LoggingConfig,
}

/// How to reach the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// adb serial of the target device. `None` lets adb pick the only device.
    pub serial: Option<String>,
    /// Path to the `adb` executable.
    pub adb_path: PathBuf,
    /// Run device operations privileged.
    pub root: bool,
}

/// The application under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Android package name, e.g. `org.mozilla.fennec`.
    pub package: String,
    /// Profile directory on the device. Minidumps are looked up below it.
    pub profile_dir: Option<String>,
}

/// Crash evidence collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    /// Host directory receiving traces, tombstones and dump copies.
    pub upload_dir: PathBuf,
    /// Host directory holding the symbol store for the build under test.
    pub symbols_path: Option<PathBuf>,
    /// Host path of the `minidump_stackwalk` executable.
    pub stackwalk_binary: Option<PathBuf>,
    /// Remove dumps from the device once pulled.
    pub clean: bool,
    /// Upper bound on dumps analyzed per pass.
    pub max_dumps: usize,
    /// Kill the stack walker after this many seconds. Unset blocks forever.
    pub stackwalk_timeout_secs: Option<u64>,
    /// Report a missing minidump directory as a profile error.
    pub report_missing_crash_dir: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/droidcrash/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("droidcrash")
            .join("config.yaml")
    }

    /// The validated application package.
    pub fn app_package(&self) -> Result<AppPackage, crate::domain::DomainError> {
        AppPackage::new(self.app.package.clone())
    }

    /// The validated profile directory, if one is configured.
    pub fn profile_dir(&self) -> Result<Option<DevicePath>, crate::domain::DomainError> {
        match self.app.profile_dir.as_deref() {
            None => Ok(None),
            Some(dir) if dir.trim().is_empty() => Ok(None),
            Some(dir) => DevicePath::new(dir).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: PathBuf::from("adb"),
            root: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            package: "org.mozilla.fennec".to_string(),
            profile_dir: None,
        }
    }
}

impl Default for CrashConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("droidcrash");
        Self {
            upload_dir: data_dir.join("upload"),
            symbols_path: None,
            stackwalk_binary: None,
            clean: true,
            max_dumps: 10,
            stackwalk_timeout_secs: None,
            report_missing_crash_dir: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"crash.max_dumps"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- device ---
        if self.device.adb_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "device.adb_path".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(serial) = &self.device.serial {
            if serial.is_empty() || serial.contains(char::is_whitespace) {
                errors.push(ValidationError {
                    field: "device.serial".into(),
                    message: format!("invalid serial '{serial}'"),
                });
            }
        }

        // --- app ---
        if let Err(e) = self.app_package() {
            errors.push(ValidationError {
                field: "app.package".into(),
                message: e.to_string(),
            });
        }
        if let Err(e) = self.profile_dir() {
            errors.push(ValidationError {
                field: "app.profile_dir".into(),
                message: e.to_string(),
            });
        }

        // --- crash ---
        if self.crash.max_dumps == 0 {
            errors.push(ValidationError {
                field: "crash.max_dumps".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.crash.stackwalk_timeout_secs == Some(0) {
            errors.push(ValidationError {
                field: "crash.stackwalk_timeout_secs".into(),
                message: "must be greater than 0 when set".into(),
            });
        }
        if let Some(binary) = &self.crash.stackwalk_binary {
            if !binary.exists() {
                errors.push(ValidationError {
                    field: "crash.stackwalk_binary".into(),
                    message: format!("file does not exist: {}", binary.display()),
                });
            }
        }
        if let Some(symbols) = &self.crash.symbols_path {
            if !symbols.as_os_str().is_empty() && !symbols.exists() {
                errors.push(ValidationError {
                    field: "crash.symbols_path".into(),
                    message: format!("directory does not exist: {}", symbols.display()),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use droidcrash_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .app_package("org.mozilla.fennec_aurora")
///     .app_profile_dir("/mnt/sdcard/tests/profile")
///     .crash_upload_dir(PathBuf::from("/tmp/upload"))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- device ---

    pub fn device_serial(mut self, serial: impl Into<String>) -> Self {
        self.config.device.serial = Some(serial.into());
        self
    }

    pub fn device_adb_path(mut self, path: PathBuf) -> Self {
        self.config.device.adb_path = path;
        self
    }

    pub fn device_root(mut self, root: bool) -> Self {
        self.config.device.root = root;
        self
    }

    // --- app ---

    pub fn app_package(mut self, package: impl Into<String>) -> Self {
        self.config.app.package = package.into();
        self
    }

    pub fn app_profile_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.app.profile_dir = Some(dir.into());
        self
    }

    // --- crash ---

    pub fn crash_upload_dir(mut self, dir: PathBuf) -> Self {
        self.config.crash.upload_dir = dir;
        self
    }

    pub fn crash_symbols_path(mut self, path: PathBuf) -> Self {
        self.config.crash.symbols_path = Some(path);
        self
    }

    pub fn crash_stackwalk_binary(mut self, path: PathBuf) -> Self {
        self.config.crash.stackwalk_binary = Some(path);
        self
    }

    pub fn crash_clean(mut self, clean: bool) -> Self {
        self.config.crash.clean = clean;
        self
    }

    pub fn crash_max_dumps(mut self, n: usize) -> Self {
        self.config.crash.max_dumps = n;
        self
    }

    pub fn crash_stackwalk_timeout_secs(mut self, secs: u64) -> Self {
        self.config.crash.stackwalk_timeout_secs = Some(secs);
        self
    }

    pub fn crash_report_missing_crash_dir(mut self, report: bool) -> Self {
        self.config.crash.report_missing_crash_dir = report;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or the
    /// list of validation errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
