//! Error constructor utilities.
//!
//! Helper functions for creating OCRError instances with appropriate context and
//! error chaining, so call sites stay one line long.

use super::types::{OCRError, ProcessingStage, SimpleError};

impl OCRError {
    /// Wraps an error raised inside a cascade stage.
    pub fn stage_error(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an OCRError for tensor reshaping or layout failures.
    pub fn tensor_operation(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::stage_error(ProcessingStage::TensorOperation, context, error)
    }

    /// Creates an OCRError for a failed `infer` call.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The model the call was made against.
    /// * `context` - What was being attempted.
    /// * `error` - The underlying runtime error.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an inference error for a named output the model did not produce.
    pub fn missing_output(model_name: &str, output_name: &str) -> Self {
        Self::inference_error(
            model_name,
            &format!("model produced no output named '{}'", output_name),
            SimpleError::new("missing output tensor"),
        )
    }

    /// Creates an OCRError for model load failures with contextual suggestions.
    ///
    /// # Arguments
    /// * `model_path` - Path to the model file
    /// * `reason` - Short reason description
    /// * `suggestion` - Optional suggestion message (without punctuation)
    /// * `source` - Optional underlying error
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error from a plain message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a configuration error with a suggestion for recovery.
    pub fn config_error_with_suggestion(
        context: impl Into<String>,
        details: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "{}: {}; suggestion: {}",
                context.into(),
                details.into(),
                suggestion.into()
            ),
        }
    }

    /// Creates a configuration error for missing required fields.
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::ConfigError {
            message: format!(
                "missing required field '{}' in {}",
                field.into(),
                context.into()
            ),
        }
    }

    /// Creates a configuration error for invalid field values.
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_error_includes_suggestion() {
        let err = OCRError::model_load_error(
            "models/detector.onnx",
            "failed to create ONNX session",
            Some("check the model path"),
            None::<SimpleError>,
        );
        let message = err.to_string();
        assert!(message.contains("models/detector.onnx"));
        assert!(message.contains("; suggested fix: check the model path"));
    }

    #[test]
    fn test_missing_output_names_model_and_tensor() {
        let err = OCRError::missing_output("decoder", "hidden");
        let message = err.to_string();
        assert!(message.contains("decoder"));
        assert!(message.contains("hidden"));
    }

    #[test]
    fn test_invalid_field_message() {
        let err = OCRError::invalid_field("probability_threshold", "a value in [0, 1]", "1.5");
        assert_eq!(
            err.to_string(),
            "configuration: invalid value for field 'probability_threshold': expected a value in [0, 1], got 1.5"
        );
    }
}
