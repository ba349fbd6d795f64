//! Image loading and JPEG helpers.

use crate::core::OCRError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
pub fn load_image(path: &Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Decodes an in-memory image (any format image-rs recognises).
pub fn load_image_from_memory(bytes: &[u8]) -> Result<RgbImage, OCRError> {
    let img = image::load_from_memory(bytes).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Encodes `image` as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, OCRError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(OCRError::ImageLoad)?;
    Ok(buffer)
}

/// Passes `image` through a JPEG encode/decode cycle.
///
/// Produces the pixels a consumer of the stored JPEG page would see.
pub fn jpeg_round_trip(image: &RgbImage, quality: u8) -> Result<RgbImage, OCRError> {
    let bytes = encode_jpeg(image, quality)?;
    let decoded = image::load(Cursor::new(bytes), ImageFormat::Jpeg).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(decoded))
}

/// Writes `image` to `path` as JPEG.
pub fn save_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), OCRError> {
    std::fs::write(path, encode_jpeg(image, quality)?)?;
    Ok(())
}
