//! Domain types shared by the cascade stages.
//!
//! - [`alphabet`]: the symbol table the decoder indexes into
//! - [`detection`]: detector results and the confidence filter that turns them
//!   into page-space regions

pub mod alphabet;
pub mod detection;

pub use alphabet::Alphabet;
pub use detection::{Detection, DetectionSet, Region};
