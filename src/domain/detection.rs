//! Detector results and the confidence filter.

use crate::core::errors::{OCRError, OcrResult, ProcessingStage, SimpleError};
use crate::processors::{BoundingBox, ImageScaleInfo};
use ndarray::{ArrayD, Axis};

/// One candidate text region as reported by the detector.
///
/// The box is in model-input coordinates. Mask and feature tensors are opaque
/// and carried through unchanged.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: u32,
    pub raw_mask: ArrayD<f32>,
    pub text_feature: ArrayD<f32>,
}

/// A detection that passed the confidence filter, with its box in page pixels.
#[derive(Debug, Clone)]
pub struct Region {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: u32,
    /// Not rescaled; masks stay in the detector's mask resolution.
    pub raw_mask: ArrayD<f32>,
    pub text_feature: ArrayD<f32>,
}

/// All detections of one page, in detector order.
#[derive(Debug, Clone, Default)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    /// Builds the set by zipping the detector's five outputs positionally.
    ///
    /// `scores` decides the number of entries; every other output must carry
    /// the same number of rows along its first axis, and each box row must
    /// hold at least four coordinates.
    pub fn from_outputs(
        boxes: ArrayD<f32>,
        scores: ArrayD<f32>,
        classes: ArrayD<f32>,
        raw_masks: ArrayD<f32>,
        text_features: ArrayD<f32>,
    ) -> OcrResult<Self> {
        let scores: Vec<f32> = scores.iter().copied().collect();
        let count = scores.len();
        if count == 0 {
            return Ok(Self::default());
        }

        for (name, shape) in [
            ("boxes", boxes.shape()),
            ("classes", classes.shape()),
            ("raw_masks", raw_masks.shape()),
            ("text_features", text_features.shape()),
        ] {
            if shape.first().copied() != Some(count) {
                return Err(OCRError::stage_error(
                    ProcessingStage::Detection,
                    format!(
                        "detector output '{}' has shape {:?}, expected {} rows to match 'scores'",
                        name, shape, count
                    ),
                    SimpleError::new("mismatched detector outputs"),
                ));
            }
        }
        let classes: Vec<f32> = classes.iter().copied().collect();
        if classes.len() != count {
            return Err(OCRError::stage_error(
                ProcessingStage::Detection,
                format!("expected one class id per detection, got {}", classes.len()),
                SimpleError::new("mismatched detector outputs"),
            ));
        }

        let mut detections = Vec::with_capacity(count);
        for (i, (score, class)) in scores.into_iter().zip(classes).enumerate() {
            let row: Vec<f32> = boxes.index_axis(Axis(0), i).iter().copied().collect();
            let bbox = BoundingBox::from_row(&row).ok_or_else(|| {
                OCRError::stage_error(
                    ProcessingStage::Detection,
                    format!("box {} has {} coordinates, expected at least 4", i, row.len()),
                    SimpleError::new("malformed box row"),
                )
            })?;
            detections.push(Detection {
                bbox,
                score,
                class_id: class.max(0.0) as u32,
                raw_mask: raw_masks.index_axis(Axis(0), i).to_owned(),
                text_feature: text_features.index_axis(Axis(0), i).to_owned(),
            });
        }

        Ok(Self { detections })
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    /// Keeps detections scoring strictly above `threshold` and maps their boxes
    /// back to page pixels.
    ///
    /// Order is preserved. An empty result is not an error.
    pub fn filter_and_rescale(self, threshold: f32, scale: &ImageScaleInfo) -> Vec<Region> {
        self.detections
            .into_iter()
            .filter(|d| d.score > threshold)
            .map(|d| Region {
                bbox: d.bbox.unscale(scale.scale_x, scale.scale_y),
                score: d.score,
                class_id: d.class_id,
                raw_mask: d.raw_mask,
                text_feature: d.text_feature,
            })
            .collect()
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, IxDyn};

    fn set_with_scores(scores: &[f32]) -> DetectionSet {
        let n = scores.len();
        let boxes = Array2::from_shape_fn((n, 4), |(i, j)| (i * 10 + j) as f32 * 2.0);
        DetectionSet::from_outputs(
            boxes.into_dyn(),
            Array1::from(scores.to_vec()).into_dyn(),
            Array1::from_elem(n, 1.0f32).into_dyn(),
            ArrayD::from_shape_fn(IxDyn(&[n, 2, 2]), |idx| idx[0] as f32),
            ArrayD::from_shape_fn(IxDyn(&[n, 3, 2, 2]), |idx| idx[0] as f32 + 0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_zip_outputs_positionally() {
        let set = set_with_scores(&[0.9, 0.2]);
        assert_eq!(set.len(), 2);
        let second = set.iter().nth(1).unwrap();
        assert_eq!(second.bbox.to_array(), [20.0, 22.0, 24.0, 26.0]);
        assert_eq!(second.class_id, 1);
        assert_eq!(second.raw_mask.shape(), &[2, 2]);
        assert_eq!(second.text_feature.shape(), &[3, 2, 2]);
        assert_eq!(second.text_feature[[0, 0, 0]], 1.5);
    }

    #[test]
    fn test_filter_keeps_strictly_above_threshold_in_order() {
        let scale = ImageScaleInfo::new(100, 100, 100, 100);
        let regions = set_with_scores(&[0.9, 0.3, 0.7]).filter_and_rescale(0.5, &scale);

        let scores: Vec<f32> = regions.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.7]);
        // third detection's feature survived with it
        assert_eq!(regions[1].text_feature[[0, 0, 0]], 2.5);

        let at_threshold = set_with_scores(&[0.5]).filter_and_rescale(0.5, &scale);
        assert!(at_threshold.is_empty());
    }

    #[test]
    fn test_filter_is_monotonic_in_threshold() {
        let scores = [0.05, 0.4, 0.41, 0.5, 0.77, 0.99, 1.0];
        let scale = ImageScaleInfo::new(10, 10, 10, 10);
        let thresholds = [0.0, 0.1, 0.4, 0.5, 0.6, 0.99, 1.0];
        let counts: Vec<usize> = thresholds
            .iter()
            .map(|&t| set_with_scores(&scores).filter_and_rescale(t, &scale).len())
            .collect();
        assert!(counts.windows(2).all(|w| w[1] <= w[0]), "{:?}", counts);
        assert_eq!(counts.last(), Some(&0));
    }

    #[test]
    fn test_boxes_mapped_back_to_page_pixels() {
        // page 200x400 stretched to 100x100
        let scale = ImageScaleInfo::new(200, 400, 100, 100);
        let regions = set_with_scores(&[0.8]).filter_and_rescale(0.5, &scale);
        assert_eq!(regions[0].bbox.to_array(), [0.0, 8.0, 8.0, 24.0]);
        assert_eq!(regions[0].raw_mask.shape(), &[2, 2]);
    }

    #[test]
    fn test_empty_outputs_give_empty_set() {
        let set = DetectionSet::from_outputs(
            ArrayD::zeros(IxDyn(&[0, 4])),
            ArrayD::zeros(IxDyn(&[0])),
            ArrayD::zeros(IxDyn(&[0])),
            ArrayD::zeros(IxDyn(&[0, 28, 28])),
            ArrayD::zeros(IxDyn(&[0, 64, 28, 28])),
        )
        .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = DetectionSet::from_outputs(
            ArrayD::zeros(IxDyn(&[1, 4])),
            ArrayD::zeros(IxDyn(&[2])),
            ArrayD::zeros(IxDyn(&[2])),
            ArrayD::zeros(IxDyn(&[2, 28, 28])),
            ArrayD::zeros(IxDyn(&[2, 64, 28, 28])),
        )
        .unwrap_err();
        assert!(err.to_string().contains("boxes"));
    }
}
