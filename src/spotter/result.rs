//! Result types for the text spotting cascade.

use crate::models::StopReason;
use crate::processors::BoundingBox;
use serde::Serialize;
use std::fmt;

/// One decoded region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionText {
    /// Region box in page pixels.
    pub bounding_box: BoundingBox,
    /// Detector confidence.
    pub score: f32,
    pub class_id: u32,
    /// Decoded string. May be empty.
    pub text: String,
    pub stop_reason: StopReason,
}

/// Everything recovered from one page.
///
/// Regions are in detector order and only include detections that passed the
/// confidence filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageResult {
    /// Zero-based page position in the input document.
    pub page_index: usize,
    /// Number of detections before filtering.
    pub detection_count: usize,
    pub regions: Vec<RegionText>,
}

impl PageResult {
    pub fn new(page_index: usize, detection_count: usize, regions: Vec<RegionText>) -> Self {
        Self {
            page_index,
            detection_count,
            regions,
        }
    }

    /// Decoded strings in region order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|region| region.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

impl fmt::Display for PageResult {
    /// The page's strings joined by single spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, text) in self.texts().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(text)?;
        }
        Ok(())
    }
}
