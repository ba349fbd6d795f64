//! Configuration management for the text spotting cascade.
//!
//! This module provides configuration types, validation traits, and the device
//! allow-list used to place the cascade's sessions.

pub mod device;
pub mod errors;
pub mod onnx;
pub mod parallel;

pub use device::DevicePreference;
pub use errors::{ConfigError, ConfigValidator};
pub use onnx::*;
pub use parallel::ParallelPolicy;
