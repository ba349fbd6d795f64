//! Error types for the text spotting cascade.
//!
//! # Usage
//!
//! ```rust
//! use textspot_ocr::core::errors::{OCRError, ProcessingStage};
//!
//! let error = OCRError::stage_error(
//!     ProcessingStage::Encoding,
//!     "region 3",
//!     std::io::Error::new(std::io::ErrorKind::InvalidData, "bad feature blob"),
//! );
//! assert!(error.to_string().contains("feature encoding"));
//!
//! let config_error = OCRError::missing_field("output", "options file");
//! assert!(matches!(config_error, OCRError::ConfigError { .. }));
//! ```

pub mod constructors;
pub mod types;

pub use types::{OCRError, ProcessingStage, SimpleError};

/// Convenient result alias for cascade operations.
pub type OcrResult<T> = Result<T, OCRError>;
