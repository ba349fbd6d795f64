//! Model wrappers for the three cascade stages.
//!
//! Each wrapper owns a shared [`InferenceEngine`](crate::core::InferenceEngine)
//! and knows its model's tensor names and layouts; none of them holds state
//! between calls.

pub mod detection;
pub mod recognition;

pub use detection::{RegionDetector, RegionDetectorOutput};
pub use recognition::{
    CharacterDecoder, DecodeOutcome, DecoderState, EncodedSequence, FeatureEncoder, StopReason,
    SymbolEncoding,
};
