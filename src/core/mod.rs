//! The core module of the text spotting cascade.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration management and validation
//! - Constants used throughout the cascade
//! - Error handling
//! - The inference runtime abstraction and its ONNX Runtime implementation

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;

pub use config::{
    ConfigError, ConfigValidator, DevicePreference, OrtExecutionProvider, OrtSessionConfig,
    ParallelPolicy,
};
pub use constants::*;
pub use errors::{OCRError, OcrResult, ProcessingStage, SimpleError};
pub use inference::{
    run_stage, InferenceEngine, NamedTensors, OrtInfer, ScriptedEngine, TensorValue,
};
