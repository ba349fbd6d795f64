//! Greedy autoregressive character decoder.
//!
//! Each step feeds the previous symbol, the recurrent hidden state and the
//! encoded region to the decoder model, takes the argmax of the symbol scores
//! and either stops or appends one character. The state is an explicit value:
//! a step consumes it and returns its successor.

use crate::core::config::ConfigError;
use crate::core::constants::{DEFAULT_MAX_DECODE_STEPS, EOS_INDEX, SOS_INDEX};
use crate::core::inference::{run_stage, InferenceEngine, TensorValue};
use crate::core::{OCRError, OcrResult, ProcessingStage, SimpleError};
use crate::domain::Alphabet;
use crate::models::recognition::encoder::EncodedSequence;
use ndarray::{arr1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub const PREV_SYMBOL_INPUT: &str = "prev_symbol";
pub const PREV_HIDDEN_INPUT: &str = "prev_hidden";
pub const ENCODER_OUTPUTS_INPUT: &str = "encoder_outputs";
pub const DECODER_OUTPUT: &str = "output";
pub const DECODER_HIDDEN_OUTPUT: &str = "hidden";

/// Element type of the `prev_symbol` input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolEncoding {
    #[default]
    F32,
    I64,
}

impl FromStr for SymbolEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "float" => Ok(Self::F32),
            "i64" | "int64" => Ok(Self::I64),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown symbol encoding '{}', expected f32 or i64", other),
            }),
        }
    }
}

impl SymbolEncoding {
    fn tensor(self, symbol: usize) -> TensorValue {
        match self {
            Self::F32 => TensorValue::Float(arr1(&[symbol as f32]).into_dyn()),
            Self::I64 => TensorValue::Int(arr1(&[symbol as i64]).into_dyn()),
        }
    }
}

/// Why a decode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The end marker was predicted.
    EndOfSequence,
    /// The predicted index has no character in the alphabet.
    OutOfVocabulary,
    /// The step bound was reached without either of the above.
    StepLimit,
}

/// What one decoder call produced.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Scores over symbol indices. Any shape; the flattened argmax is taken.
    pub scores: ArrayD<f32>,
    pub hidden: ArrayD<f32>,
}

/// Recurrent state threaded through the decode loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderState {
    pub hidden: ArrayD<f32>,
    pub prev_symbol: usize,
    pub text: String,
}

/// Result of applying one step to a state.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Continue(DecoderState),
    Stop(DecoderState, StopReason),
}

impl DecoderState {
    /// Zero hidden state, start marker, empty text.
    pub fn initial(hidden_shape: &[usize]) -> Self {
        Self {
            hidden: ArrayD::zeros(IxDyn(hidden_shape)),
            prev_symbol: SOS_INDEX,
            text: String::new(),
        }
    }

    /// Applies one decoder output.
    ///
    /// Stopping leaves text and hidden state untouched.
    pub fn advance(self, output: StepOutput, alphabet: &Alphabet) -> OcrResult<Transition> {
        let next = argmax(output.scores.iter().copied()).ok_or_else(|| {
            OCRError::stage_error(
                ProcessingStage::Decoding,
                "decoder produced an empty score vector",
                SimpleError::new("empty decoder output"),
            )
        })?;

        if next == EOS_INDEX {
            return Ok(Transition::Stop(self, StopReason::EndOfSequence));
        }
        match alphabet.get(next) {
            None => Ok(Transition::Stop(self, StopReason::OutOfVocabulary)),
            Some(symbol) => {
                let mut text = self.text;
                text.push(symbol);
                Ok(Transition::Continue(Self {
                    hidden: output.hidden,
                    prev_symbol: next,
                    text,
                }))
            }
        }
    }
}

/// A finished decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub text: String,
    pub stop_reason: StopReason,
    /// Decoder calls made.
    pub steps: usize,
}

/// Index of the largest score; ties go to the lowest index.
///
/// A NaN compares above every number, so the first NaN wins. Returns `None`
/// only for an empty input.
pub fn argmax(scores: impl IntoIterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        if score.is_nan() {
            return Some(index);
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Runs the greedy loop with `step` producing each decoder output.
///
/// Makes at most `max_steps` calls to `step`. Errors from `step` propagate;
/// every other outcome, including a degenerate one, yields the text so far.
pub fn greedy_decode<F>(
    initial: DecoderState,
    alphabet: &Alphabet,
    max_steps: usize,
    mut step: F,
) -> OcrResult<DecodeOutcome>
where
    F: FnMut(&DecoderState) -> OcrResult<StepOutput>,
{
    let mut state = initial;
    for steps in 1..=max_steps {
        let output = step(&state)?;
        match state.advance(output, alphabet)? {
            Transition::Continue(next) => state = next,
            Transition::Stop(last, stop_reason) => {
                return Ok(DecodeOutcome {
                    text: last.text,
                    stop_reason,
                    steps,
                });
            }
        }
    }

    Ok(DecodeOutcome {
        text: state.text,
        stop_reason: StopReason::StepLimit,
        steps: max_steps,
    })
}

/// The recognizer's decoder model with its decoding parameters.
#[derive(Debug, Clone)]
pub struct CharacterDecoder {
    engine: Arc<dyn InferenceEngine>,
    alphabet: Alphabet,
    hidden_shape: Vec<usize>,
    max_steps: usize,
    symbol_encoding: SymbolEncoding,
}

impl CharacterDecoder {
    pub fn new(engine: Arc<dyn InferenceEngine>, alphabet: Alphabet, hidden_shape: Vec<usize>) -> Self {
        Self {
            engine,
            alphabet,
            hidden_shape,
            max_steps: DEFAULT_MAX_DECODE_STEPS,
            symbol_encoding: SymbolEncoding::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_symbol_encoding(mut self, symbol_encoding: SymbolEncoding) -> Self {
        self.symbol_encoding = symbol_encoding;
        self
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn hidden_shape(&self) -> &[usize] {
        &self.hidden_shape
    }

    /// Decodes one encoded region into text.
    pub fn decode(&self, encoded: &EncodedSequence) -> OcrResult<DecodeOutcome> {
        let encoder_outputs = encoded.as_array().clone().into_dyn();

        greedy_decode(
            DecoderState::initial(&self.hidden_shape),
            &self.alphabet,
            self.max_steps,
            |state| {
                let [scores, hidden] = run_stage(
                    self.engine.as_ref(),
                    [
                        (PREV_SYMBOL_INPUT, self.symbol_encoding.tensor(state.prev_symbol)),
                        (PREV_HIDDEN_INPUT, TensorValue::Float(state.hidden.clone())),
                        (ENCODER_OUTPUTS_INPUT, TensorValue::Float(encoder_outputs.clone())),
                    ],
                    [DECODER_OUTPUT, DECODER_HIDDEN_OUTPUT],
                )?;
                Ok(StepOutput {
                    scores: scores.into_f32(),
                    hidden: hidden.into_f32(),
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::{NamedTensors, ScriptedEngine};
    use ndarray::Array3;

    fn one_hot(index: usize, width: usize) -> ArrayD<f32> {
        let mut scores = ArrayD::zeros(IxDyn(&[1, width]));
        scores[[0, index]] = 1.0;
        scores
    }

    /// Decoder engine predicting `script[call]`, then `fallback` forever.
    fn scripted_decoder(script: Vec<usize>, fallback: usize, width: usize) -> ScriptedEngine {
        ScriptedEngine::with_responder("decoder", move |inputs, call| {
            let index = script.get(call).copied().unwrap_or(fallback);
            let hidden = inputs[PREV_HIDDEN_INPUT].clone().into_f32() + 1.0;
            let mut out = NamedTensors::new();
            out.insert(DECODER_OUTPUT.to_string(), TensorValue::Float(one_hot(index, width)));
            out.insert(DECODER_HIDDEN_OUTPUT.to_string(), TensorValue::Float(hidden));
            Ok(out)
        })
    }

    fn encoded() -> EncodedSequence {
        let engine = Arc::new(ScriptedEngine::new("encoder").push_outputs([(
            "output",
            TensorValue::Float(ArrayD::zeros(IxDyn(&[1, 4, 1, 3]))),
        )]));
        crate::models::recognition::FeatureEncoder::new(engine)
            .encode(&ArrayD::zeros(IxDyn(&[2, 1, 1])))
            .unwrap()
    }

    fn decoder(engine: ScriptedEngine, alphabet: &str) -> CharacterDecoder {
        CharacterDecoder::new(Arc::new(engine), Alphabet::new(alphabet).unwrap(), vec![1, 1, 2])
    }

    #[test]
    fn test_end_marker_first_gives_empty_text() {
        let outcome = decoder(scripted_decoder(vec![1], 1, 2), "AB")
            .decode(&encoded())
            .unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.stop_reason, StopReason::EndOfSequence);
        assert_eq!(outcome.steps, 1);
    }

    #[test]
    fn test_appends_until_end_marker() {
        let outcome = decoder(scripted_decoder(vec![2, 3, 1], 1, 4), " AB")
            .decode(&encoded())
            .unwrap();
        assert_eq!(outcome.text, "AB");
        assert_eq!(outcome.steps, 3);
    }

    #[test]
    fn test_step_bound_without_end_marker() {
        let engine = Arc::new(scripted_decoder(vec![], 2, 3));
        let decoder = CharacterDecoder::new(engine.clone(), Alphabet::new("  x").unwrap(), vec![1, 2])
            .with_max_steps(5);

        let outcome = decoder.decode(&encoded()).unwrap();
        assert_eq!(outcome.text, "xxxxx");
        assert_eq!(outcome.stop_reason, StopReason::StepLimit);
        assert_eq!(engine.call_count(), 5);

        let default_bound = CharacterDecoder::new(
            Arc::new(scripted_decoder(vec![], 2, 3)),
            Alphabet::new("  x").unwrap(),
            vec![1, 2],
        );
        let outcome = default_bound.decode(&encoded()).unwrap();
        assert_eq!(outcome.text.chars().count(), DEFAULT_MAX_DECODE_STEPS);
    }

    #[test]
    fn test_out_of_vocabulary_index_stops() {
        let outcome = decoder(scripted_decoder(vec![5], 5, 6), "AB")
            .decode(&encoded())
            .unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.stop_reason, StopReason::OutOfVocabulary);

        let outcome = decoder(scripted_decoder(vec![2, 7], 1, 8), "  q")
            .decode(&encoded())
            .unwrap();
        assert_eq!(outcome.text, "q");
    }

    #[test]
    fn test_state_threaded_between_steps() {
        let engine = Arc::new(scripted_decoder(vec![2, 3, 1], 1, 4));
        let decoder = CharacterDecoder::new(engine.clone(), Alphabet::new(" AB").unwrap(), vec![1, 2])
            .with_symbol_encoding(SymbolEncoding::I64);
        decoder.decode(&encoded()).unwrap();

        let calls = engine.recorded_inputs();
        assert_eq!(calls.len(), 3);
        let symbols: Vec<TensorValue> = calls.iter().map(|c| c[PREV_SYMBOL_INPUT].clone()).collect();
        assert_eq!(symbols[0], TensorValue::Int(arr1(&[0i64]).into_dyn()));
        assert_eq!(symbols[1], TensorValue::Int(arr1(&[2i64]).into_dyn()));
        assert_eq!(symbols[2], TensorValue::Int(arr1(&[3i64]).into_dyn()));

        // hidden starts at zero and is replaced by each step's output
        let hidden: Vec<f32> = calls
            .iter()
            .map(|c| c[PREV_HIDDEN_INPUT].clone().into_f32()[[0, 0]])
            .collect();
        assert_eq!(hidden, vec![0.0, 1.0, 2.0]);
        assert_eq!(calls[0][ENCODER_OUTPUTS_INPUT].shape(), &[1, 3, 4]);
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax([0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax([-1.0, -3.0, -2.0]), Some(0));
        assert_eq!(argmax(Vec::<f32>::new()), None);
    }

    #[test]
    fn test_argmax_first_nan_wins() {
        assert_eq!(argmax([f32::NAN, f32::NAN, f32::NAN]), Some(0));
        assert_eq!(argmax([0.0, f32::NAN, 0.9, 0.0]), Some(1));
        assert_eq!(argmax([0.9, 0.1, f32::NAN]), Some(2));
    }

    #[test]
    fn test_nan_scores_do_not_abort_decoding() {
        let alphabet = Alphabet::new("_.AB").unwrap();
        let nan_row = |values: &[f32]| {
            ArrayD::from_shape_vec(IxDyn(&[1, values.len()]), values.to_vec()).unwrap()
        };

        // all NaN picks index 0, which is appended like any other symbol
        let outcome = greedy_decode(DecoderState::initial(&[1]), &alphabet, 3, |_| {
            Ok(StepOutput {
                scores: nan_row(&[f32::NAN; 4]),
                hidden: ArrayD::zeros(IxDyn(&[1])),
            })
        })
        .unwrap();
        assert_eq!(outcome.text, "___");
        assert_eq!(outcome.stop_reason, StopReason::StepLimit);

        // a NaN on the end marker stops even beside a larger score
        let outcome = greedy_decode(DecoderState::initial(&[1]), &alphabet, 3, |_| {
            Ok(StepOutput {
                scores: nan_row(&[0.0, f32::NAN, 0.9, 0.0]),
                hidden: ArrayD::zeros(IxDyn(&[1])),
            })
        })
        .unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.stop_reason, StopReason::EndOfSequence);
    }

    #[test]
    fn test_empty_scores_are_an_error() {
        let state = DecoderState::initial(&[1]);
        let output = StepOutput {
            scores: ArrayD::zeros(IxDyn(&[1, 0])),
            hidden: ArrayD::zeros(IxDyn(&[1])),
        };
        assert!(state.advance(output, &Alphabet::default()).is_err());
    }

    #[test]
    fn test_greedy_decode_terminates_within_bound() {
        let alphabet = Alphabet::default();
        for max_steps in [0, 1, 7, 28] {
            let mut calls = 0;
            let outcome = greedy_decode(DecoderState::initial(&[1]), &alphabet, max_steps, |_| {
                calls += 1;
                Ok(StepOutput {
                    scores: one_hot(calls % 5 + 2, 38),
                    hidden: ArrayD::zeros(IxDyn(&[1])),
                })
            })
            .unwrap();
            assert!(outcome.steps <= max_steps);
            assert_eq!(calls, max_steps);
        }
    }

    #[test]
    fn test_advance_keeps_state_on_stop() {
        let state = DecoderState {
            hidden: Array3::<f32>::ones((1, 1, 2)).into_dyn(),
            prev_symbol: 4,
            text: "ab".into(),
        };
        let output = StepOutput {
            scores: one_hot(1, 5),
            hidden: ArrayD::zeros(IxDyn(&[1, 1, 2])),
        };
        let alphabet = Alphabet::new("  abc").unwrap();
        match state.clone().advance(output, &alphabet).unwrap() {
            Transition::Stop(last, StopReason::EndOfSequence) => assert_eq!(last, state),
            other => panic!("unexpected transition {:?}", other),
        }
    }
}
