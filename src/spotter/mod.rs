//! The text spotting pipeline.
//!
//! # Main APIs
//!
//! - [`TextSpotterBuilder`] - loads the detector, encoder and decoder models
//! - [`TextSpotter`] - runs pages through the cascade
//! - [`ResultWriter`] - appends page results to the output file

pub mod cascade;
pub mod result;
pub mod writer;

pub use cascade::{TextSpotter, TextSpotterBuilder, TextSpotterConfig};
pub use result::{PageResult, RegionText};
pub use writer::{ResultWriter, PAGE_SEPARATOR};
