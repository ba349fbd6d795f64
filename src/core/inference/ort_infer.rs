//! ONNX Runtime implementation of [`InferenceEngine`].

use super::{InferenceEngine, NamedTensors, TensorValue};
use crate::core::config::OrtSessionConfig;
use crate::core::errors::{OCRError, OcrResult, SimpleError};
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::{DynValue, Value, ValueType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[path = "ort_infer_config.rs"]
mod ort_infer_config;

/// A loaded ONNX model.
///
/// The session is guarded by a mutex because running it needs exclusive
/// access; concurrent callers are serialized.
pub struct OrtInfer {
    session: Mutex<Session>,
    output_names: Vec<String>,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("output_names", &self.output_names)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Loads a model, applying `config` when given.
    ///
    /// Without a configuration the session runs on the CPU provider with ORT
    /// logging reduced to errors.
    pub fn new(model_path: impl AsRef<Path>, config: Option<&OrtSessionConfig>) -> OcrResult<Self> {
        let path = model_path.as_ref();
        let builder = Session::builder()?;
        let builder = match config {
            Some(cfg) => Self::apply_ort_config(builder, cfg)?,
            None => builder.with_log_level(LogLevel::Error)?,
        };
        let session = builder.commit_from_file(path).map_err(|e| {
            OCRError::model_load_error(
                path,
                "failed to create ONNX session",
                Some("check device/EP configuration and model file"),
                Some(e),
            )
        })?;

        let output_names = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect::<Vec<_>>();
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            "Loaded model '{}' with inputs {:?} and outputs {:?}",
            model_name,
            session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>(),
            output_names
        );

        Ok(Self {
            session: Mutex::new(session),
            output_names,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Declared shape of the named input. Dynamic dimensions are returned as `-1`.
    pub fn input_shape(&self, name: &str) -> Option<Vec<i64>> {
        let session = self.session.lock().ok()?;
        let input = session.inputs.iter().find(|input| input.name == name)?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    fn to_session_value(
        &self,
        name: &str,
        tensor: TensorValue,
    ) -> OcrResult<SessionInputValue<'static>> {
        let shape = tensor.shape().to_vec();
        let value = match tensor {
            TensorValue::Float(array) => Value::from_array(array).map(SessionInputValue::from),
            TensorValue::Int(array) => Value::from_array(array).map(SessionInputValue::from),
        };
        value.map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!("failed to convert input '{}' with shape {:?}", name, shape),
                e,
            )
        })
    }

    fn extract_output(&self, name: &str, value: &DynValue) -> OcrResult<TensorValue> {
        if let Ok(array) = value.try_extract_array::<f32>() {
            return Ok(TensorValue::Float(array.to_owned()));
        }
        if let Ok(array) = value.try_extract_array::<i64>() {
            return Ok(TensorValue::Int(array.to_owned()));
        }
        if let Ok(array) = value.try_extract_array::<i32>() {
            return Ok(TensorValue::Int(array.mapv(i64::from)));
        }
        Err(OCRError::inference_error(
            &self.model_name,
            &format!("output '{}' is not an f32 or integer tensor", name),
            SimpleError::new("unsupported output element type"),
        ))
    }
}

impl InferenceEngine for OrtInfer {
    fn infer(&self, inputs: NamedTensors) -> OcrResult<NamedTensors> {
        let mut session_inputs: Vec<(String, SessionInputValue<'static>)> =
            Vec::with_capacity(inputs.len());
        for (name, tensor) in inputs {
            let value = self.to_session_value(&name, tensor)?;
            session_inputs.push((name, value));
        }

        let mut session = self.session.lock().map_err(|_| {
            OCRError::inference_error(
                &self.model_name,
                "failed to acquire session lock",
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session.run(session_inputs).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "ONNX Runtime forward pass failed for '{}'",
                    self.model_path.display()
                ),
                e,
            )
        })?;

        let mut produced = NamedTensors::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let value = outputs
                .get(name.as_str())
                .ok_or_else(|| OCRError::missing_output(&self.model_name, name))?;
            produced.insert(name.clone(), self.extract_output(name, value)?);
        }
        Ok(produced)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
