//! A deterministic inference engine that replays prepared outputs.
//!
//! Useful wherever the cascade must run without model files: every call is
//! recorded, and outputs come either from a queue of prepared results or from
//! a responder closure that sees the inputs and the call index.

use super::{InferenceEngine, NamedTensors, TensorValue};
use crate::core::errors::{OCRError, OcrResult, SimpleError};
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&NamedTensors, usize) -> OcrResult<NamedTensors> + Send + Sync>;

/// Inference engine returning scripted outputs.
pub struct ScriptedEngine {
    name: String,
    queue: Mutex<VecDeque<NamedTensors>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<NamedTensors>>,
}

impl std::fmt::Debug for ScriptedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedEngine")
            .field("name", &self.name)
            .field("has_responder", &self.responder.is_some())
            .finish_non_exhaustive()
    }
}

impl ScriptedEngine {
    /// Creates an engine with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates an engine that answers every call with `responder`.
    pub fn with_responder<F>(name: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&NamedTensors, usize) -> OcrResult<NamedTensors> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new(name)
        }
    }

    /// Appends one call's worth of outputs to the script.
    ///
    /// Queued outputs are consumed before the responder is consulted.
    pub fn push_outputs<'a>(self, outputs: impl IntoIterator<Item = (&'a str, TensorValue)>) -> Self {
        let named = outputs
            .into_iter()
            .map(|(name, tensor)| (name.to_string(), tensor))
            .collect();
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(named);
        }
        self
    }

    /// Number of `infer` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Inputs of every call made so far, in call order.
    pub fn recorded_inputs(&self) -> Vec<NamedTensors> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn lock_error(&self) -> OCRError {
        OCRError::inference_error(
            &self.name,
            "scripted engine state unavailable",
            SimpleError::new("lock poisoned"),
        )
    }
}

impl InferenceEngine for ScriptedEngine {
    fn infer(&self, inputs: NamedTensors) -> OcrResult<NamedTensors> {
        let call_index = {
            let mut calls = self.calls.lock().map_err(|_| self.lock_error())?;
            calls.push(inputs.clone());
            calls.len() - 1
        };

        let queued = self
            .queue
            .lock()
            .map_err(|_| self.lock_error())?
            .pop_front();
        if let Some(outputs) = queued {
            return Ok(outputs);
        }

        match &self.responder {
            Some(responder) => responder(&inputs, call_index),
            None => Err(OCRError::inference_error(
                &self.name,
                &format!("no scripted output for call {}", call_index),
                SimpleError::new("script exhausted"),
            )),
        }
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_queue_then_responder() {
        let engine = ScriptedEngine::with_responder("probe", |_, index| {
            let mut out = NamedTensors::new();
            out.insert(
                "index".to_string(),
                TensorValue::Int(ArrayD::from_elem(IxDyn(&[1]), index as i64)),
            );
            Ok(out)
        })
        .push_outputs([(
            "index",
            TensorValue::Int(ArrayD::from_elem(IxDyn(&[1]), -1)),
        )]);

        let first = engine.infer(NamedTensors::new()).unwrap();
        let second = engine.infer(NamedTensors::new()).unwrap();
        assert_eq!(first["index"].clone().into_f32()[[0]], -1.0);
        assert_eq!(second["index"].clone().into_f32()[[0]], 1.0);
        assert_eq!(engine.call_count(), 2);
    }

    #[test]
    fn test_exhausted_script_fails() {
        let engine = ScriptedEngine::new("empty");
        assert!(engine.infer(NamedTensors::new()).is_err());
        assert_eq!(engine.call_count(), 1);
    }
}
