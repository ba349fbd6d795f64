//! Inference runtime abstraction.
//!
//! Every cascade stage talks to its model through [`InferenceEngine`], a
//! capability with a single `infer` operation over named tensors. The ONNX
//! Runtime implementation lives in [`ort_infer`]; [`scripted`] provides a
//! deterministic engine that replays prepared outputs.

pub mod ort_infer;
pub mod scripted;
pub mod stage;

use crate::core::errors::OcrResult;
use ndarray::ArrayD;
use std::collections::HashMap;

pub use ort_infer::OrtInfer;
pub use scripted::ScriptedEngine;
pub use stage::run_stage;

/// A tensor exchanged with the inference runtime.
///
/// Models in the cascade consume and produce f32 tensors almost everywhere;
/// integer tensors appear for symbol indices and class ids in some exports.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Float(ArrayD<f32>),
    Int(ArrayD<i64>),
}

impl TensorValue {
    /// Shape of the underlying array.
    pub fn shape(&self) -> &[usize] {
        match self {
            TensorValue::Float(array) => array.shape(),
            TensorValue::Int(array) => array.shape(),
        }
    }

    /// Converts into an f32 array, casting integer tensors.
    pub fn into_f32(self) -> ArrayD<f32> {
        match self {
            TensorValue::Float(array) => array,
            TensorValue::Int(array) => array.mapv(|v| v as f32),
        }
    }
}

impl From<ArrayD<f32>> for TensorValue {
    fn from(array: ArrayD<f32>) -> Self {
        TensorValue::Float(array)
    }
}

impl From<ArrayD<i64>> for TensorValue {
    fn from(array: ArrayD<i64>) -> Self {
        TensorValue::Int(array)
    }
}

/// Tensors keyed by the model's input or output names.
pub type NamedTensors = HashMap<String, TensorValue>;

/// The inference runtime capability.
///
/// Calls are synchronous and block until the model has produced every output.
/// Tensor shapes are declared by the loaded model; implementations are not
/// expected to validate them beyond what the runtime itself reports.
pub trait InferenceEngine: Send + Sync + std::fmt::Debug {
    /// Runs the model once on `inputs` and returns all of its outputs.
    fn infer(&self, inputs: NamedTensors) -> OcrResult<NamedTensors>;

    /// Name used in diagnostics.
    fn model_name(&self) -> &str;
}
