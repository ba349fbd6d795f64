//! # textspot-ocr
//!
//! Text spotting for scanned documents on ONNX Runtime. Each page runs
//! through a three-stage cascade:
//!
//! 1. a region detector finds text regions and their feature embeddings,
//! 2. an encoder turns each region's embedding into a sequence,
//! 3. a greedy autoregressive decoder spells the sequence out character by
//!    character.
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors and the inference runtime abstraction
//! * [`domain`] - Alphabet, detections and the confidence filter
//! * [`models`] - The three model stages
//! * [`processors`] - Page preprocessing and box geometry
//! * [`spotter`] - The page pipeline and the result writer
//! * [`utils`] - Image I/O and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use textspot_ocr::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spotter = TextSpotterBuilder::new(
//!     "models/detector.onnx",
//!     "models/encoder.onnx",
//!     "models/decoder.onnx",
//! )
//! .build()?;
//!
//! let mut writer = ResultWriter::create("out.txt")?;
//! let page = load_image(Path::new("page.jpg"))?;
//! let result = spotter.process_page(0, &page)?;
//! writer.write_page(&result)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod processors;
pub mod spotter;
pub mod utils;

pub use crate::core::{OCRError, OcrResult};

/// Prelude module for convenient imports.
///
/// ```rust
/// use textspot_ocr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{OCRError, OcrResult};
    pub use crate::domain::Alphabet;
    pub use crate::spotter::{
        PageResult, RegionText, ResultWriter, TextSpotter, TextSpotterBuilder, TextSpotterConfig,
    };
    pub use crate::utils::load_image;
}
