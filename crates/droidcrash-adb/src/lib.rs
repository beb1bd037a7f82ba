//! Droidcrash ADB - Device agent backed by the Android Debug Bridge
//!
//! [`AdbDevice`] implements the `IDeviceAgent` port by running the host
//! `adb` executable. Each call is a separate blocking `adb` invocation;
//! nothing is cached between calls.

pub mod device;
pub mod error;

pub use device::AdbDevice;
pub use error::AdbError;
