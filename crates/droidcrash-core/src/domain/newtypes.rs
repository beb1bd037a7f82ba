//! Domain newtypes with validation
//!
//! Device paths and application packages come from volatile configuration
//! and end up inside shell command lines executed on the device. Each
//! newtype validates at construction time so that no later string
//! concatenation can smuggle shell syntax onto the device.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::DomainError;

/// Well-known location of the ANR trace file.
pub const ANR_TRACES_PATH: &str = "/data/anr/traces.txt";

/// Well-known location of the native tombstone directory.
pub const TOMBSTONES_PATH: &str = "/data/tombstones";

/// Characters the device shell interprets. Spaces are allowed and escaped
/// by [`DevicePath::shell_arg`].
const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '$', '`', '<', '>', '(', ')', '\'', '"', '\\', '*', '?', '!', '{', '}', '[',
    ']', '~', '#', '\n', '\r', '\t',
];

static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").expect("valid package regex")
});

// ============================================================================
// DevicePath
// ============================================================================

/// An absolute, shell-safe path on the device
///
/// A path may designate the *contents* of a directory (see
/// [`DevicePath::contents`]), which renders as `<dir>/*` when passed to the
/// device shell. This is the only way a wildcard reaches a command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DevicePath {
    path: String,
    contents: bool,
}

impl DevicePath {
    /// Create a validated device path
    ///
    /// Trailing slashes are removed, so `/a/b/` and `/a/b` are the same path.
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let raw = path.into();

        if raw.trim().is_empty() {
            return Err(DomainError::InvalidDevicePath("path is empty".to_string()));
        }
        if !raw.starts_with('/') {
            return Err(DomainError::InvalidDevicePath(raw));
        }
        if raw.contains(SHELL_METACHARACTERS) {
            return Err(DomainError::UnsafeShellArgument(raw));
        }

        let trimmed = raw.trim_end_matches('/');
        let path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };

        Ok(Self {
            path,
            contents: false,
        })
    }

    /// The ANR trace file
    pub fn anr_traces() -> Self {
        Self {
            path: ANR_TRACES_PATH.to_string(),
            contents: false,
        }
    }

    /// The tombstone directory
    pub fn tombstones() -> Self {
        Self {
            path: TOMBSTONES_PATH.to_string(),
            contents: false,
        }
    }

    /// Append a relative segment (which may itself contain `/`)
    pub fn join(&self, segment: &str) -> Result<Self, DomainError> {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return Err(DomainError::InvalidDevicePath(format!(
                "empty segment joined to {}",
                self.path
            )));
        }
        let base = if self.path == "/" { "" } else { &self.path };
        Self::new(format!("{base}/{segment}"))
    }

    /// The entries inside this directory rather than the directory itself
    #[must_use]
    pub fn contents(&self) -> Self {
        Self {
            path: self.path.clone(),
            contents: true,
        }
    }

    /// Whether this path designates directory contents
    pub fn is_contents(&self) -> bool {
        self.contents
    }

    /// The plain path, without any contents wildcard
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Render for inclusion in a device shell command line
    ///
    /// Spaces are backslash-escaped; validation guarantees nothing else
    /// needs quoting.
    pub fn shell_arg(&self) -> String {
        let escaped = self.path.replace(' ', "\\ ");
        if self.contents {
            format!("{escaped}/*")
        } else {
            escaped
        }
    }
}

impl Display for DevicePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.contents {
            write!(f, "{}/*", self.path)
        } else {
            write!(f, "{}", self.path)
        }
    }
}

impl FromStr for DevicePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DevicePath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

// ============================================================================
// AppPackage
// ============================================================================

/// A validated Android application package name, e.g. `org.mozilla.fennec`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppPackage(String);

impl AppPackage {
    /// Create a validated package name
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if !PACKAGE_RE.is_match(&name) {
            return Err(DomainError::InvalidPackage(name));
        }
        Ok(Self(name))
    }

    /// Get the package name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory where the crash reporter parks reports not yet submitted
    pub fn pending_crash_reports_dir(&self) -> DevicePath {
        // Package syntax and the fixed suffix are both shell-safe, so this
        // cannot fail validation.
        DevicePath {
            path: format!("/data/data/{}/files/mozilla/Crash Reports/pending", self.0),
            contents: false,
        }
    }
}

impl Display for AppPackage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppPackage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AppPackage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
