//! Uncaught Java exception detection
//!
//! The runtime logs an uncaught exception as a marker line followed by the
//! exception type and the first stack frame:
//!
//! ```text
//! 01-30 20:15:41.937 E/GeckoAppShell( 1703): >>> REPORTING UNCAUGHT EXCEPTION FROM THREAD 9 ("GeckoBackgroundThread")
//! 01-30 20:15:41.937 E/GeckoAppShell( 1703): java.lang.NullPointerException
//! 01-30 20:15:41.937 E/GeckoAppShell( 1703): 	at org.mozilla.gecko.GeckoApp$21.run(GeckoApp.java:1833)
//! ```
//!
//! The date, tag and pid prefix is stripped from the two lines after the
//! marker and the remainders are joined into the signature.

use droidcrash_core::domain::ErrorReport;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::context::CollectorContext;

/// Substrings announcing an uncaught exception
pub const EXCEPTION_MARKERS: &[&str] = &["REPORTING UNCAUGHT EXCEPTION", "FATAL EXCEPTION"];

/// Everything up to the last `): ` (and an optional tab) is log prefix.
static LOG_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\): \t?(.*)").expect("valid log prefix regex"));

/// Strip the event-log prefix from `line`
///
/// Returns `None` when the line has no prefix or nothing follows it.
pub fn strip_log_prefix(line: &str) -> Option<&str> {
    LOG_PREFIX_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end())
        .filter(|s| !s.is_empty())
}

/// Signature of the first uncaught exception in `lines`
///
/// Only the first marker is considered. A marker without two following
/// lines means the log was cut short and yields nothing. When the location
/// line carries no log prefix the signature is the exception type alone,
/// with no trailing space.
pub fn find_java_exception<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let index = lines.iter().position(|line| {
        let line = line.as_ref();
        EXCEPTION_MARKERS.iter().any(|marker| line.contains(marker))
    })?;

    if lines.len() < index + 3 {
        warn!("Automation Error: event log is truncated after exception marker");
        return None;
    }

    let Some(exception_type) = strip_log_prefix(lines[index + 1].as_ref()) else {
        debug!(line = lines[index + 1].as_ref(), "Exception marker not followed by exception type");
        return None;
    };

    match strip_log_prefix(lines[index + 2].as_ref()) {
        Some(location) => Some(format!("{exception_type} {location}")),
        None => Some(exception_type.to_string()),
    }
}

/// Scans the device event log for an uncaught Java exception
#[derive(Debug, Clone)]
pub struct JavaExceptionScanner {
    ctx: CollectorContext,
}

impl JavaExceptionScanner {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }

    /// At most one `JavaException` report for the current event log
    pub fn get_java_exception(&self) -> Option<ErrorReport> {
        let _guard = self.ctx.span().enter();

        let lines = match self.ctx.device().event_log(self.ctx.root()) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "Could not fetch event log");
                return None;
            }
        };

        let signature = find_java_exception(&lines)?;
        info!(signature = %signature, "Java exception found");
        Some(ErrorReport::JavaException { signature })
    }
}
