//! Region detector stage.

pub mod region_detector;

pub use region_detector::{RegionDetector, RegionDetectorOutput};
