//! Image and geometry processing for the cascade.
//!
//! This module turns page rasters into detector inputs and holds the box type
//! used to carry region geometry between model space and page space.

pub mod geometry;
pub mod preprocess;
pub mod types;

pub use geometry::BoundingBox;
pub use preprocess::{PagePreprocessor, PreprocessedPage};
pub use types::{ColorOrder, ImageScaleInfo};
