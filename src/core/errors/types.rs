//! Core error types for the text spotting cascade.
//!
//! This module defines the fundamental error types used throughout the crate,
//! including the main OCRError enum and the ProcessingStage enum that tells
//! which part of the cascade a failure came from.

use thiserror::Error;

/// Enum representing the stages of the text spotting cascade.
///
/// Used to attach context to processing errors so a diagnostic names the stage
/// that failed rather than just the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Resize, pad and channel reordering of a page image.
    Preprocessing,
    /// Region detection on the preprocessed page.
    Detection,
    /// Confidence filtering and coordinate rescaling.
    Filtering,
    /// Per-region feature encoding.
    Encoding,
    /// Autoregressive character decoding.
    Decoding,
    /// Writing page results to the output sink.
    Output,
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Preprocessing => write!(f, "preprocessing"),
            ProcessingStage::Detection => write!(f, "region detection"),
            ProcessingStage::Filtering => write!(f, "confidence filtering"),
            ProcessingStage::Encoding => write!(f, "feature encoding"),
            ProcessingStage::Decoding => write!(f, "character decoding"),
            ProcessingStage::Output => write!(f, "result output"),
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// A plain message error used as the source of structured errors when no
/// underlying library error exists.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Enum representing the errors that can occur in the text spotting cascade.
///
/// Configuration problems, model loading failures and inference failures are
/// all fatal for a run; decode edge cases never surface here.
#[derive(Error, Debug)]
pub enum OCRError {
    /// Error occurred while loading or decoding an image.
    #[error("image load: {0}")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during inference.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor reshaping.
    #[error("tensor operation: {0}")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a model file, with context and suggestions.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the model that failed to load
        model_path: String,
        /// Short reason string
        reason: String,
        /// Optional suggestion (prefixed with '; ' when present)
        suggestion: String,
        /// Underlying source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}
