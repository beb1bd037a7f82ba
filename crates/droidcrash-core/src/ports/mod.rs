//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the collectors depend on; their
//! implementations live in adapter crates or in test doubles.
//!
//! ## Ports Overview
//!
//! - [`IDeviceAgent`] - Blocking remote commands against one device
//! - [`ISymbolicator`] - Native stack walker turning a minidump into text

pub mod device_agent;
pub mod symbolicator;

pub use device_agent::{IDeviceAgent, ModeOptions, RemoveOptions};
pub use symbolicator::{ISymbolicator, SymbolicatorOutput};
