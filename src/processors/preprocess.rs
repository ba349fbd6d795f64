//! Page preprocessing for the region detector.
//!
//! A page is stretched to the detector's input size (aspect ratio is not
//! preserved; the two scale factors are kept so boxes can be mapped back),
//! zero-padded on the bottom and right up to the tensor's declared shape, and
//! converted from interleaved pixels to a planar `(1, 3, H, W)` f32 tensor.
//! Pixel values are not normalized.

use crate::core::errors::{OCRError, OcrResult, ProcessingStage, SimpleError};
use crate::processors::types::{ColorOrder, ImageScaleInfo};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

/// A page ready for the detector, with the information needed to undo the resize.
#[derive(Debug, Clone)]
pub struct PreprocessedPage {
    /// `(1, 3, model_height, model_width)` tensor.
    pub tensor: Array4<f32>,
    /// Scale factors and content extent.
    pub scale: ImageScaleInfo,
}

impl PreprocessedPage {
    /// The `im_info` tensor row expected by the detector.
    pub fn image_info(&self) -> [f32; 3] {
        self.scale.image_info()
    }
}

/// Resizes, pads and reorders page images for the detector.
#[derive(Debug, Clone)]
pub struct PagePreprocessor {
    model_height: u32,
    model_width: u32,
    resize_target: Option<(u32, u32)>,
    color_order: ColorOrder,
}

impl PagePreprocessor {
    /// Creates a preprocessor for a detector with the given input height and width.
    pub fn new(model_height: u32, model_width: u32) -> Self {
        Self {
            model_height,
            model_width,
            resize_target: None,
            color_order: ColorOrder::default(),
        }
    }

    /// Resizes pages to `(width, height)` instead of the full tensor shape.
    ///
    /// The target is clamped to the tensor shape; the remainder is zero padding.
    pub fn with_resize_target(mut self, width: u32, height: u32) -> Self {
        self.resize_target = Some((width.min(self.model_width), height.min(self.model_height)));
        self
    }

    /// Sets the channel order written into the tensor.
    pub fn with_color_order(mut self, color_order: ColorOrder) -> Self {
        self.color_order = color_order;
        self
    }

    /// Tensor input shape as `(height, width)`.
    pub fn model_shape(&self) -> (u32, u32) {
        (self.model_height, self.model_width)
    }

    /// Converts one page image into a detector input.
    pub fn apply(&self, image: &RgbImage) -> OcrResult<PreprocessedPage> {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(OCRError::stage_error(
                ProcessingStage::Preprocessing,
                format!("page image has zero extent ({}x{})", src_w, src_h),
                SimpleError::new("empty image"),
            ));
        }

        let (target_w, target_h) = self
            .resize_target
            .unwrap_or((self.model_width, self.model_height));
        let scale = ImageScaleInfo::new(src_w, src_h, target_w, target_h);
        let resized = imageops::resize(image, target_w, target_h, FilterType::Triangle);

        let channel_map: [usize; 3] = match self.color_order {
            ColorOrder::RGB => [0, 1, 2],
            ColorOrder::BGR => [2, 1, 0],
        };

        // Zero-initialised, so anything outside the resized content is padding.
        let mut tensor = Array4::<f32>::zeros((
            1,
            3,
            self.model_height as usize,
            self.model_width as usize,
        ));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for (c, &src_c) in channel_map.iter().enumerate() {
                tensor[[0, c, y as usize, x as usize]] = pixel[src_c] as f32;
            }
        }

        Ok(PreprocessedPage { tensor, scale })
    }
}
