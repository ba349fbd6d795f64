//! The shared "build inputs, call infer, take outputs" step used by every stage.

use super::{InferenceEngine, NamedTensors, TensorValue};
use crate::core::errors::{OCRError, OcrResult};

/// Runs `engine` once and returns the requested outputs in the order given.
///
/// Outputs the model produces but the caller did not ask for are dropped. A
/// requested output that is absent is an inference error naming the model.
pub fn run_stage<const N: usize>(
    engine: &dyn InferenceEngine,
    inputs: impl IntoIterator<Item = (&'static str, TensorValue)>,
    outputs: [&str; N],
) -> OcrResult<[TensorValue; N]> {
    let named: NamedTensors = inputs
        .into_iter()
        .map(|(name, tensor)| (name.to_string(), tensor))
        .collect();

    let mut produced = engine.infer(named)?;

    let mut taken = Vec::with_capacity(N);
    for name in outputs {
        let tensor = produced
            .remove(name)
            .ok_or_else(|| OCRError::missing_output(engine.model_name(), name))?;
        taken.push(tensor);
    }

    taken
        .try_into()
        .map_err(|_| OCRError::invalid_input("stage output count mismatch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::ScriptedEngine;
    use ndarray::{ArrayD, IxDyn};

    fn scalar(value: f32) -> TensorValue {
        TensorValue::Float(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    #[test]
    fn test_outputs_returned_in_requested_order() {
        let engine = ScriptedEngine::new("probe").push_outputs([
            ("a", scalar(1.0)),
            ("b", scalar(2.0)),
            ("unused", scalar(3.0)),
        ]);

        let [b, a] = run_stage(&engine, [("x", scalar(0.0))], ["b", "a"]).unwrap();
        assert_eq!(b, scalar(2.0));
        assert_eq!(a, scalar(1.0));
    }

    #[test]
    fn test_inputs_reach_the_engine_by_name() {
        let engine = ScriptedEngine::new("probe").push_outputs([("y", scalar(0.0))]);
        run_stage(&engine, [("im_data", scalar(7.0))], ["y"]).unwrap();

        let calls = engine.recorded_inputs();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("im_data"), Some(&scalar(7.0)));
    }

    #[test]
    fn test_missing_output_is_an_inference_error() {
        let engine = ScriptedEngine::new("encoder").push_outputs([("other", scalar(0.0))]);
        let err = run_stage(&engine, [("input", scalar(0.0))], ["output"]).unwrap_err();
        assert!(matches!(err, OCRError::Inference { .. }));
        assert!(err.to_string().contains("encoder"));
    }
}
