//! Feature encoder stage.
//!
//! Projects a region's text feature into the sequence layout the decoder
//! attends over: the model output `(B, C, ...)` is flattened to
//! `(B, C, spatial)` and transposed to `(B, spatial, C)`.

use crate::core::inference::{run_stage, InferenceEngine, TensorValue};
use crate::core::{OCRError, OcrResult, ProcessingStage, SimpleError};
use ndarray::{Array3, ArrayD, Axis};
use std::sync::Arc;

pub const ENCODER_INPUT: &str = "input";
pub const ENCODER_OUTPUT: &str = "output";

/// A `(1, sequence_length, feature_dim)` encoder result for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSequence(Array3<f32>);

impl EncodedSequence {
    pub fn sequence_length(&self) -> usize {
        self.0.shape()[1]
    }

    pub fn feature_dim(&self) -> usize {
        self.0.shape()[2]
    }

    pub fn as_array(&self) -> &Array3<f32> {
        &self.0
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.0
    }
}

/// The recognizer's encoder model.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    engine: Arc<dyn InferenceEngine>,
}

impl FeatureEncoder {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self { engine }
    }

    /// Encodes one region's text feature.
    ///
    /// The feature is given without a batch axis; one is inserted before the
    /// call.
    pub fn encode(&self, text_feature: &ArrayD<f32>) -> OcrResult<EncodedSequence> {
        let batched = text_feature.clone().insert_axis(Axis(0));
        let [output] = run_stage(
            self.engine.as_ref(),
            [(ENCODER_INPUT, TensorValue::Float(batched))],
            [ENCODER_OUTPUT],
        )?;
        to_sequence(output.into_f32())
    }
}

/// Reshapes `(B, C, ...)` to `(B, C, spatial)` and swaps the last two axes.
fn to_sequence(output: ArrayD<f32>) -> OcrResult<EncodedSequence> {
    let shape = output.shape().to_vec();
    if shape.len() < 2 {
        return Err(OCRError::stage_error(
            ProcessingStage::Encoding,
            format!("encoder output has shape {:?}, expected at least 2 axes", shape),
            SimpleError::new("unexpected encoder output rank"),
        ));
    }
    let (batch, channels) = (shape[0], shape[1]);
    let spatial: usize = shape[2..].iter().product();

    let flat = output
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((batch, channels, spatial))
        .map_err(|e| OCRError::tensor_operation("flattening encoder output", e))?;

    Ok(EncodedSequence(
        flat.permuted_axes([0, 2, 1]).as_standard_layout().into_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::ScriptedEngine;
    use ndarray::IxDyn;

    #[test]
    fn test_flatten_then_transpose() {
        // (1, C=2, 2, 2): channel 0 holds 0..4, channel 1 holds 10..14
        let output = ArrayD::from_shape_vec(
            IxDyn(&[1, 2, 2, 2]),
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0],
        )
        .unwrap();
        let seq = to_sequence(output).unwrap();

        assert_eq!(seq.sequence_length(), 4);
        assert_eq!(seq.feature_dim(), 2);
        let array = seq.as_array();
        assert_eq!(array[[0, 0, 0]], 0.0);
        assert_eq!(array[[0, 0, 1]], 10.0);
        assert_eq!(array[[0, 3, 0]], 3.0);
        assert_eq!(array[[0, 3, 1]], 13.0);
        assert!(array.is_standard_layout());
    }

    #[test]
    fn test_encode_adds_batch_axis() {
        let engine = Arc::new(ScriptedEngine::new("encoder").push_outputs([(
            "output",
            TensorValue::Float(ArrayD::zeros(IxDyn(&[1, 256, 1, 28]))),
        )]));
        let encoder = FeatureEncoder::new(engine.clone());

        let feature = ArrayD::<f32>::zeros(IxDyn(&[64, 28, 28]));
        let seq = encoder.encode(&feature).unwrap();

        assert_eq!(seq.as_array().shape(), &[1, 28, 256]);
        assert_eq!(
            engine.recorded_inputs()[0][ENCODER_INPUT].shape(),
            &[1, 64, 28, 28]
        );
    }

    #[test]
    fn test_rank_one_output_rejected() {
        let output = ArrayD::<f32>::zeros(IxDyn(&[4]));
        assert!(to_sequence(output).is_err());
    }
}
