//! Droidcrash Collect - Crash evidence collection and triage
//!
//! Provides:
//! - `AnrCollector`: captures and clears the ANR trace file
//! - `TombstoneCollector`: pulls and collision-safely renames native tombstones
//! - `DumpCollector`: pulls, bounds, copies and symbolicates minidumps
//! - `JavaExceptionScanner`: finds the first uncaught Java exception in the event log
//! - `MinidumpStackwalk`: process-backed `ISymbolicator`
//! - `CrashProcessor`: runs every stage in order and returns one error list
//!
//! Every stage swallows and logs its own failures. A collection pass
//! always yields a (possibly empty) list of reports.

pub mod anr;
pub mod context;
pub mod dumps;
pub mod error;
pub mod java_exception;
pub mod namer;
pub mod processor;
pub mod signature;
pub mod stackwalk;
pub mod tombstone;

pub use anr::AnrCollector;
pub use context::CollectorContext;
pub use dumps::{crash_report_from, DumpCollector, DumpPull, DEFAULT_MAX_DUMPS};
pub use error::CollectError;
pub use java_exception::JavaExceptionScanner;
pub use processor::{CrashProcessor, ProcessorSettings};
pub use stackwalk::{analyze_dump, MinidumpStackwalk};
pub use tombstone::TombstoneCollector;
