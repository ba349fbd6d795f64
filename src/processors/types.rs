//! Types used in page preprocessing.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::config::ConfigError;

/// Specifies the color channel order fed to the detector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorOrder {
    /// Red, Green, Blue order (the order image-rs decodes into)
    RGB,
    /// Blue, Green, Red order (the order OpenCV-trained models expect)
    #[default]
    BGR,
}

impl FromStr for ColorOrder {
    type Err = ConfigError;

    fn from_str(order: &str) -> Result<Self, Self::Err> {
        match order.to_ascii_uppercase().as_str() {
            "RGB" => Ok(ColorOrder::RGB),
            "BGR" => Ok(ColorOrder::BGR),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown color order '{}', expected RGB or BGR", other),
            }),
        }
    }
}

/// Information about image scaling during preprocessing
///
/// Captures the two independent stretch factors applied when a page is resized
/// to the detector's input, and the extent of real image content inside the
/// (possibly padded) tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageScaleInfo {
    /// Page width before resizing
    pub src_w: u32,
    /// Page height before resizing
    pub src_h: u32,
    /// Width scaling ratio (resized_width / original_width)
    pub scale_x: f32,
    /// Height scaling ratio (resized_height / original_height)
    pub scale_y: f32,
    /// Width of the resized content inside the tensor
    pub content_w: u32,
    /// Height of the resized content inside the tensor
    pub content_h: u32,
}

impl ImageScaleInfo {
    /// Computes the scale factors for stretching a `src_w × src_h` page to
    /// `target_w × target_h`.
    pub fn new(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> Self {
        Self {
            src_w,
            src_h,
            scale_x: target_w as f32 / src_w as f32,
            scale_y: target_h as f32 / src_h as f32,
            content_w: target_w,
            content_h: target_h,
        }
    }

    /// The detector's auxiliary `im_info` row: `[content_height, content_width, 1.0]`.
    pub fn image_info(&self) -> [f32; 3] {
        [self.content_h as f32, self.content_w as f32, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors_are_independent() {
        let info = ImageScaleInfo::new(1000, 500, 1280, 768);
        assert!((info.scale_x - 1.28).abs() < 1e-6);
        assert!((info.scale_y - 1.536).abs() < 1e-6);
        assert_eq!(info.image_info(), [768.0, 1280.0, 1.0]);
    }

    #[test]
    fn test_color_order_parse() {
        assert_eq!("rgb".parse::<ColorOrder>().unwrap(), ColorOrder::RGB);
        assert_eq!("BGR".parse::<ColorOrder>().unwrap(), ColorOrder::BGR);
        assert!("GBR".parse::<ColorOrder>().is_err());
    }
}
