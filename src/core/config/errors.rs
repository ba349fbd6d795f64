//! Configuration error types and validation traits.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while validating configuration, before any inference runs.
///
/// Each variant names the check that failed so the diagnostic can be shown to
/// the user as-is.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A mandatory field was not supplied by any configuration source.
    #[error("missing required option '{field}'")]
    MissingField { field: &'static str },

    /// A numeric option lies outside its permitted range.
    #[error("option '{field}' must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: String,
    },

    /// A path option points at a file that does not exist or cannot be read.
    #[error("{what} not found or unreadable: {path}")]
    PathNotFound { what: &'static str, path: PathBuf },

    /// The requested device is not on the allow-list.
    #[error("device '{device}' is not supported (allowed: {allowed})")]
    DeviceNotAllowed { device: String, allowed: String },

    /// An options file could not be parsed.
    #[error("failed to parse options file {path}: {message}")]
    OptionsFile { path: PathBuf, message: String },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implementors provide [`validate`](ConfigValidator::validate); the provided
/// methods cover the checks that recur across configuration types.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Checks that `path` names an existing, readable file.
    fn validate_file_path(&self, what: &'static str, path: &Path) -> Result<(), ConfigError> {
        match std::fs::File::open(path) {
            Ok(_) if path.is_file() => Ok(()),
            _ => Err(ConfigError::PathNotFound {
                what,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Checks that `value` lies in the closed interval `[0, 1]`.
    fn validate_unit_interval(&self, field: &'static str, value: f32) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                field,
                range: "[0, 1]",
                value: value.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl ConfigValidator for Probe {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    #[test]
    fn test_unit_interval_bounds_are_inclusive() {
        assert!(Probe.validate_unit_interval("t", 0.0).is_ok());
        assert!(Probe.validate_unit_interval("t", 1.0).is_ok());
        assert!(Probe.validate_unit_interval("t", -0.01).is_err());
        assert!(Probe.validate_unit_interval("t", 1.01).is_err());
        assert!(Probe.validate_unit_interval("t", f32::NAN).is_err());
    }

    #[test]
    fn test_file_path_must_exist() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(Probe.validate_file_path("model", file.path()).is_ok());

        let err = Probe
            .validate_file_path("detector model", Path::new("/nonexistent/det.onnx"))
            .unwrap_err();
        assert!(err.to_string().contains("detector model"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Probe.validate_file_path("input", dir.path()).is_err());
    }
}
