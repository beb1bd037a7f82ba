//! Terminal rendering for droidcrash commands
//!
//! Human mode prints a marked headline followed by indented detail lines.
//! JSON mode prints one document per command on stdout and nothing else,
//! so headlines and details are dropped there.

use anyhow::{Context, Result};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Tone of a headline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing needs attention
    Clean,
    /// Crashes were found or the input has problems
    Findings,
}

impl Status {
    fn marker(self) -> char {
        match self {
            Status::Clean => '\u{2713}',
            Status::Findings => '\u{2717}',
        }
    }
}

/// Writes command results to stdout in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Console {
    format: OutputFormat,
}

impl Console {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn headline(&self, status: Status, message: &str) {
        if !self.format.is_json() {
            println!("{}", headline_text(status, message));
        }
    }

    pub fn detail(&self, line: &str) {
        if !self.format.is_json() {
            println!("  {line}");
        }
    }

    pub fn blank(&self) {
        if !self.format.is_json() {
            println!();
        }
    }

    /// Print `value` as the command's JSON document
    pub fn document(&self, value: &serde_json::Value) -> Result<()> {
        if self.format.is_json() {
            let text = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
            println!("{text}");
        }
        Ok(())
    }
}

fn headline_text(status: Status, message: &str) -> String {
    format!("{} {message}", status.marker())
}

/// `count` followed by `noun`, pluralized with a trailing `s`
pub fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
