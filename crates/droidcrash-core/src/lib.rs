//! Droidcrash Core - Domain types and ports for crash evidence collection
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `ErrorReport`, `StackInfo`, validated `DevicePath` and `AppPackage`
//! - **Port definitions** - Traits for adapters: `IDeviceAgent`, `ISymbolicator`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module has no knowledge of how a device is reached or how a
//! minidump is symbolicated. Ports define the trait interfaces that adapter
//! crates implement, and the collectors in `droidcrash-collect` drive those
//! ports.

pub mod config;
pub mod domain;
pub mod ports;
