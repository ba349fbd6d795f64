//! The page pipeline: detect, filter, then encode and decode every region.
//!
//! [`TextSpotterBuilder`] loads the three ONNX models and works out the tensor
//! shapes they declare; [`TextSpotter`] runs pages through them one at a time.

use super::result::{PageResult, RegionText};
use crate::core::config::{ConfigError, ConfigValidator, OrtSessionConfig, ParallelPolicy};
use crate::core::constants::{DEFAULT_MAX_DECODE_STEPS, DEFAULT_PROBABILITY_THRESHOLD};
use crate::core::inference::{InferenceEngine, OrtInfer};
use crate::core::{OCRError, OcrResult};
use crate::domain::{Alphabet, Region};
use crate::models::detection::region_detector::IMAGE_INPUT;
use crate::models::recognition::decoder::PREV_HIDDEN_INPUT;
use crate::models::{CharacterDecoder, FeatureEncoder, RegionDetector, SymbolEncoding};
use crate::processors::{ColorOrder, PagePreprocessor};
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Tunables of the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSpotterConfig {
    /// Detections must score strictly above this to be decoded.
    pub probability_threshold: f32,
    /// Upper bound on decoder calls per region.
    pub max_decode_steps: usize,
    /// Channel order of the detector input.
    pub color_order: ColorOrder,
    /// Element type of the decoder's `prev_symbol` input.
    pub symbol_encoding: SymbolEncoding,
    /// Detector input `(height, width)`. Read from the model when unset.
    pub detector_input_size: Option<(u32, u32)>,
    /// Resize pages to `(width, height)` and zero-pad the rest of the input.
    pub resize_target: Option<(u32, u32)>,
    /// Decoder hidden state shape. Read from the model when unset.
    pub hidden_shape: Option<Vec<usize>>,
    pub parallel: ParallelPolicy,
}

impl Default for TextSpotterConfig {
    fn default() -> Self {
        Self {
            probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
            max_decode_steps: DEFAULT_MAX_DECODE_STEPS,
            color_order: ColorOrder::default(),
            symbol_encoding: SymbolEncoding::default(),
            detector_input_size: None,
            resize_target: None,
            hidden_shape: None,
            parallel: ParallelPolicy::default(),
        }
    }
}

impl ConfigValidator for TextSpotterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_unit_interval("probability_threshold", self.probability_threshold)?;
        if self.max_decode_steps == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_decode_steps",
                range: ">= 1",
                value: "0".to_string(),
            });
        }
        for (field, size) in [
            ("detector_input_size", self.detector_input_size),
            ("resize_target", self.resize_target),
        ] {
            if let Some((a, b)) = size {
                if a == 0 || b == 0 {
                    return Err(ConfigError::InvalidConfig {
                        message: format!("{} must be non-zero, got {}x{}", field, a, b),
                    });
                }
            }
        }
        if let Some(shape) = &self.hidden_shape {
            if shape.is_empty() || shape.contains(&0) {
                return Err(ConfigError::InvalidConfig {
                    message: format!("hidden_shape must be non-empty and non-zero, got {:?}", shape),
                });
            }
        }
        Ok(())
    }
}

/// Builder that loads the three models.
///
/// # Example
///
/// ```no_run
/// use textspot_ocr::spotter::TextSpotterBuilder;
///
/// let spotter = TextSpotterBuilder::new(
///     "models/detector.onnx",
///     "models/encoder.onnx",
///     "models/decoder.onnx",
/// )
/// .build()
/// .expect("failed to load models");
/// ```
#[derive(Debug)]
pub struct TextSpotterBuilder {
    detector_model: PathBuf,
    encoder_model: PathBuf,
    decoder_model: PathBuf,
    alphabet: Option<Alphabet>,
    ort_session_config: Option<OrtSessionConfig>,
    config: TextSpotterConfig,
}

impl TextSpotterBuilder {
    pub fn new(
        detector_model: impl Into<PathBuf>,
        encoder_model: impl Into<PathBuf>,
        decoder_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detector_model: detector_model.into(),
            encoder_model: encoder_model.into(),
            decoder_model: decoder_model.into(),
            alphabet: None,
            ort_session_config: None,
            config: TextSpotterConfig::default(),
        }
    }

    /// Sets the decoding alphabet. Defaults to digits and lowercase latin.
    pub fn alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Sets the ONNX Runtime session configuration shared by all three models.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session_config = Some(config);
        self
    }

    pub fn config(mut self, config: TextSpotterConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the models and resolves any tensor shapes not set explicitly.
    pub fn build(self) -> OcrResult<TextSpotter> {
        self.config.validate()?;
        let ort_config = self.ort_session_config.as_ref();

        let detector = OrtInfer::new(&self.detector_model, ort_config)?;
        let encoder = OrtInfer::new(&self.encoder_model, ort_config)?;
        let decoder = OrtInfer::new(&self.decoder_model, ort_config)?;

        let mut config = self.config;
        if config.detector_input_size.is_none() {
            config.detector_input_size = Some(discover_detector_size(&detector)?);
        }
        if config.hidden_shape.is_none() {
            config.hidden_shape = Some(discover_hidden_shape(&decoder)?);
        }
        info!(
            "Loaded models: detector {} (input {:?}), encoder {}, decoder {} (hidden {:?})",
            detector.model_path().display(),
            config.detector_input_size,
            encoder.model_path().display(),
            decoder.model_path().display(),
            config.hidden_shape
        );

        TextSpotter::from_engines(
            Arc::new(detector),
            Arc::new(encoder),
            Arc::new(decoder),
            self.alphabet.unwrap_or_default(),
            config,
        )
    }
}

/// Declared dims as sizes, or `None` if any is dynamic.
fn static_dims(shape: &[i64]) -> Option<Vec<usize>> {
    shape
        .iter()
        .map(|&d| usize::try_from(d).ok().filter(|&d| d > 0))
        .collect()
}

fn discover_detector_size(detector: &OrtInfer) -> OcrResult<(u32, u32)> {
    let shape = detector.input_shape(IMAGE_INPUT).unwrap_or_default();
    match static_dims(&shape).as_deref() {
        Some([_, _, h, w]) => Ok((*h as u32, *w as u32)),
        _ => Err(OCRError::config_error_with_suggestion(
            format!("detector input '{}'", IMAGE_INPUT),
            format!("cannot read a static (N, C, H, W) shape, model declares {:?}", shape),
            "set the detector input size explicitly",
        )),
    }
}

fn discover_hidden_shape(decoder: &OrtInfer) -> OcrResult<Vec<usize>> {
    let shape = decoder.input_shape(PREV_HIDDEN_INPUT).unwrap_or_default();
    match static_dims(&shape) {
        Some(dims) if !dims.is_empty() => Ok(dims),
        _ => Err(OCRError::config_error_with_suggestion(
            format!("decoder input '{}'", PREV_HIDDEN_INPUT),
            format!("cannot read a static shape, model declares {:?}", shape),
            "set the hidden state shape explicitly",
        )),
    }
}

/// The loaded cascade.
#[derive(Debug, Clone)]
pub struct TextSpotter {
    detector: RegionDetector,
    encoder: FeatureEncoder,
    decoder: CharacterDecoder,
    probability_threshold: f32,
    parallel: ParallelPolicy,
}

impl TextSpotter {
    /// Assembles the cascade from already-loaded engines.
    ///
    /// Shapes cannot be discovered here, so `config` must carry both the
    /// detector input size and the hidden state shape.
    pub fn from_engines(
        detector: Arc<dyn InferenceEngine>,
        encoder: Arc<dyn InferenceEngine>,
        decoder: Arc<dyn InferenceEngine>,
        alphabet: Alphabet,
        config: TextSpotterConfig,
    ) -> OcrResult<Self> {
        config.validate()?;
        let (height, width) = config
            .detector_input_size
            .ok_or_else(|| OCRError::missing_field("detector_input_size", "TextSpotterConfig"))?;
        let hidden_shape = config
            .hidden_shape
            .ok_or_else(|| OCRError::missing_field("hidden_shape", "TextSpotterConfig"))?;

        let mut preprocessor = PagePreprocessor::new(height, width).with_color_order(config.color_order);
        if let Some((target_w, target_h)) = config.resize_target {
            preprocessor = preprocessor.with_resize_target(target_w, target_h);
        }

        Ok(Self {
            detector: RegionDetector::new(detector, preprocessor),
            encoder: FeatureEncoder::new(encoder),
            decoder: CharacterDecoder::new(decoder, alphabet, hidden_shape)
                .with_max_steps(config.max_decode_steps)
                .with_symbol_encoding(config.symbol_encoding),
            probability_threshold: config.probability_threshold,
            parallel: config.parallel,
        })
    }

    pub fn probability_threshold(&self) -> f32 {
        self.probability_threshold
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.decoder.alphabet()
    }

    /// Runs one page through the cascade.
    ///
    /// Regions come back in detector order whether or not they were decoded in
    /// parallel. Any inference failure aborts the page.
    pub fn process_page(&self, page_index: usize, image: &RgbImage) -> OcrResult<PageResult> {
        let start = Instant::now();
        let detected = self.detector.forward(image)?;
        let detection_count = detected.detections.len();
        let regions = detected
            .detections
            .filter_and_rescale(self.probability_threshold, &detected.scale);
        debug!(
            "Page {}: {} detections, {} above threshold {}",
            page_index,
            detection_count,
            regions.len(),
            self.probability_threshold
        );

        let texts = if self.parallel.use_parallel(regions.len()) {
            regions
                .into_par_iter()
                .enumerate()
                .map(|(i, region)| self.recognize(page_index, i, region))
                .collect::<OcrResult<Vec<_>>>()?
        } else {
            regions
                .into_iter()
                .enumerate()
                .map(|(i, region)| self.recognize(page_index, i, region))
                .collect::<OcrResult<Vec<_>>>()?
        };

        debug!("Page {} recognized in {:?}", page_index, start.elapsed());
        Ok(PageResult::new(page_index, detection_count, texts))
    }

    fn recognize(&self, page_index: usize, region_index: usize, region: Region) -> OcrResult<RegionText> {
        let encoded = self.encoder.encode(&region.text_feature)?;
        let outcome = self.decoder.decode(&encoded)?;
        debug!(
            "Page {} region {}: {:?} after {} steps ({:?})",
            page_index, region_index, outcome.text, outcome.steps, outcome.stop_reason
        );
        Ok(RegionText {
            bounding_box: region.bbox,
            score: region.score,
            class_id: region.class_id,
            text: outcome.text,
            stop_reason: outcome.stop_reason,
        })
    }
}
