//! Region detector stage.
//!
//! Takes a page image to a [`DetectionSet`]: preprocess, one `infer` call with
//! `im_data`/`im_info`, then zip the five outputs into detections.

use crate::core::inference::{run_stage, InferenceEngine, TensorValue};
use crate::core::OcrResult;
use crate::domain::DetectionSet;
use crate::processors::{ImageScaleInfo, PagePreprocessor, PreprocessedPage};
use image::RgbImage;
use ndarray::Array2;
use std::sync::Arc;

/// Input tensor names.
pub const IMAGE_INPUT: &str = "im_data";
pub const IMAGE_INFO_INPUT: &str = "im_info";

/// Output tensor names, in the order they are zipped.
pub const DETECTOR_OUTPUTS: [&str; 5] = ["boxes", "scores", "classes", "raw_masks", "text_features"];

/// Detector output for one page.
#[derive(Debug, Clone)]
pub struct RegionDetectorOutput {
    pub detections: DetectionSet,
    /// Needed to map boxes back to page pixels.
    pub scale: ImageScaleInfo,
}

/// The detection model together with its input preprocessing.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    engine: Arc<dyn InferenceEngine>,
    preprocessor: PagePreprocessor,
}

impl RegionDetector {
    pub fn new(engine: Arc<dyn InferenceEngine>, preprocessor: PagePreprocessor) -> Self {
        Self {
            engine,
            preprocessor,
        }
    }

    pub fn preprocessor(&self) -> &PagePreprocessor {
        &self.preprocessor
    }

    /// Converts a page into the detector's input tensor.
    pub fn preprocess(&self, image: &RgbImage) -> OcrResult<PreprocessedPage> {
        self.preprocessor.apply(image)
    }

    /// Runs the detector on a preprocessed page.
    pub fn infer(&self, page: &PreprocessedPage) -> OcrResult<DetectionSet> {
        let im_info = Array2::from_shape_vec((1, 3), page.image_info().to_vec())?;

        let [boxes, scores, classes, raw_masks, text_features] = run_stage(
            self.engine.as_ref(),
            [
                (IMAGE_INPUT, TensorValue::Float(page.tensor.clone().into_dyn())),
                (IMAGE_INFO_INPUT, TensorValue::Float(im_info.into_dyn())),
            ],
            DETECTOR_OUTPUTS,
        )?;

        DetectionSet::from_outputs(
            boxes.into_f32(),
            scores.into_f32(),
            classes.into_f32(),
            raw_masks.into_f32(),
            text_features.into_f32(),
        )
    }

    /// Runs the complete stage: preprocess then infer.
    pub fn forward(&self, image: &RgbImage) -> OcrResult<RegionDetectorOutput> {
        let page = self.preprocess(image)?;
        let detections = self.infer(&page)?;
        Ok(RegionDetectorOutput {
            detections,
            scale: page.scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::ScriptedEngine;
    use ndarray::{ArrayD, IxDyn};

    fn f32_tensor(shape: &[usize], values: Vec<f32>) -> TensorValue {
        TensorValue::Float(ArrayD::from_shape_vec(IxDyn(shape), values).unwrap())
    }

    #[test]
    fn test_forward_feeds_named_inputs_and_zips_outputs() {
        let engine = Arc::new(ScriptedEngine::new("detector").push_outputs([
            ("boxes", f32_tensor(&[2, 4], vec![0.0, 0.0, 8.0, 4.0, 2.0, 2.0, 6.0, 6.0])),
            ("scores", f32_tensor(&[2], vec![0.9, 0.1])),
            (
                "classes",
                TensorValue::Int(ArrayD::from_shape_vec(IxDyn(&[2]), vec![1, 1]).unwrap()),
            ),
            ("raw_masks", f32_tensor(&[2, 2, 2], vec![0.0; 8])),
            ("text_features", f32_tensor(&[2, 3, 1, 1], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
        ]));
        let detector = RegionDetector::new(engine.clone(), PagePreprocessor::new(4, 8));

        let image = RgbImage::new(16, 16);
        let output = detector.forward(&image).unwrap();

        assert_eq!(output.detections.len(), 2);
        assert_eq!(output.scale.scale_x, 0.5);
        assert_eq!(output.scale.scale_y, 0.25);

        let inputs = &engine.recorded_inputs()[0];
        assert_eq!(inputs[IMAGE_INPUT].shape(), &[1, 3, 4, 8]);
        assert_eq!(
            inputs[IMAGE_INFO_INPUT],
            f32_tensor(&[1, 3], vec![4.0, 8.0, 1.0])
        );

        let features: Vec<f32> = output
            .detections
            .iter()
            .nth(1)
            .unwrap()
            .text_feature
            .iter()
            .copied()
            .collect();
        assert_eq!(features, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_missing_output_propagates() {
        let engine = Arc::new(
            ScriptedEngine::new("detector").push_outputs([("scores", f32_tensor(&[0], vec![]))]),
        );
        let detector = RegionDetector::new(engine, PagePreprocessor::new(4, 4));
        assert!(detector.forward(&RgbImage::new(4, 4)).is_err());
    }
}
