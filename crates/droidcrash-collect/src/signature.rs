//! Crash signature extraction from stack walker output
//!
//! The top frame of the crash is the line after `Thread N (crashed)`:
//!
//! ```text
//! Thread 3 (crashed)
//!  0  libc.so + 0xa888
//!  0  libnss3.so!nssCertificate_Destroy [certificate.c : 102 + 0x0]
//!  0  libxul.so!void js::gc::MarkInternal<JSObject>(JSTracer*, JSObject**) [Marking.cpp : 92 + 0x28]
//! ```
//!
//! The frame text up to the source location is kept, with the module
//! prefix preserved and a leading `void ` dropped. The format is not
//! documented upstream; a line that does not match simply produces no
//! signature.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker on the thread header line of the crashing thread
pub const CRASHED_MARKER: &str = "(crashed)";

static FRAME_ZERO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ 0  (?P<module>[^!\[]*!)?(?:void )?(?P<frame>[^\[]+)")
        .expect("valid frame regex")
});

/// Parse a frame-0 line into `module!frame`
pub fn parse_frame_zero(line: &str) -> Option<String> {
    let caps = FRAME_ZERO_RE.captures(line)?;
    let module = caps.name("module").map(|m| m.as_str()).unwrap_or("");
    let frame = caps.name("frame")?.as_str().trim();
    if frame.is_empty() {
        return None;
    }
    Some(format!("{module}{frame}"))
}

/// `@ <frame>` for the crashing thread's top frame, if recognizable
///
/// Scanning stops at the first `(crashed)` line whether or not the line
/// after it matches.
pub fn extract_signature(stdout: &str) -> Option<String> {
    let mut lines = stdout.lines();
    lines.by_ref().find(|line| line.contains(CRASHED_MARKER))?;
    let frame = parse_frame_zero(lines.next()?)?;
    Some(format!("@ {frame}"))
}
