//! Constants shared across the cascade.

/// Alphabet index that seeds every decode.
pub const SOS_INDEX: usize = 0;

/// Alphabet index that ends a decode.
pub const EOS_INDEX: usize = 1;

/// Upper bound on decoder steps per region.
pub const DEFAULT_MAX_DECODE_STEPS: usize = 28;

/// Detections must score strictly above this to be decoded.
pub const DEFAULT_PROBABILITY_THRESHOLD: f32 = 0.5;

/// Default decoding alphabet: start marker, end marker, digits, lowercase latin.
pub const DEFAULT_ALPHABET: &str = "  0123456789abcdefghijklmnopqrstuvwxyz";

/// Default detector model location.
pub const DEFAULT_DETECTOR_MODEL: &str =
    "models/intel/text-spotting-0001-detector/FP32/text-spotting-0001-detector.onnx";

/// Default recognizer encoder model location.
pub const DEFAULT_ENCODER_MODEL: &str =
    "models/intel/text-spotting-0001-recognizer-encoder/FP32/text-spotting-0001-recognizer-encoder.onnx";

/// Default recognizer decoder model location.
pub const DEFAULT_DECODER_MODEL: &str =
    "models/intel/text-spotting-0001-recognizer-decoder/FP32/text-spotting-0001-recognizer-decoder.onnx";
