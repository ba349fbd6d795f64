//! Recognizer stages: feature encoder and autoregressive decoder.

pub mod decoder;
pub mod encoder;

pub use decoder::{
    argmax, greedy_decode, CharacterDecoder, DecodeOutcome, DecoderState, StepOutput, StopReason,
    SymbolEncoding, Transition,
};
pub use encoder::{EncodedSequence, FeatureEncoder};
