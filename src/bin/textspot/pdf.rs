//! Turning the input document into page images.
//!
//! PDFs are rendered page by page with PDFium; anything else is decoded as a
//! single page image. Pages can optionally go through a JPEG encode/decode
//! cycle and be dumped to a directory.

use crate::config::JpegOptions;
use image::RgbImage;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use textspot_ocr::utils::{jpeg_round_trip, load_image_from_memory, save_jpeg};
use textspot_ocr::OCRError;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to initialize PDFium: {0}")]
    InitError(String),

    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },

    #[error("PDF has no pages")]
    EmptyPdf,

    #[error("Failed to read input {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: OCRError,
    },
}

/// Configuration for PDF rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfRenderSettings {
    /// DPI for rendering (default: 200)
    pub dpi: f32,
    /// Maximum dimension for rendered images (default: 4000)
    pub max_dimension: u32,
}

impl Default for PdfRenderSettings {
    fn default() -> Self {
        Self {
            dpi: 200.0,
            max_dimension: 4000,
        }
    }
}

impl PdfRenderSettings {
    /// Pixel size of a page measured in points, capped at `max_dimension`.
    pub fn target_size(&self, width_points: f32, height_points: f32) -> (u32, u32) {
        // 72 points per inch
        let scale = self.dpi / 72.0;
        let mut width_px = (width_points * scale) as u32;
        let mut height_px = (height_points * scale) as u32;

        if width_px > self.max_dimension || height_px > self.max_dimension {
            let ratio = if width_px > height_px {
                self.max_dimension as f32 / width_px as f32
            } else {
                self.max_dimension as f32 / height_px as f32
            };
            width_px = (width_px as f32 * ratio) as u32;
            height_px = (height_px as f32 * ratio) as u32;
        }

        (width_px.max(1), height_px.max(1))
    }
}

/// PDF processor for converting PDF pages to images
pub struct PdfProcessor {
    pdfium: Pdfium,
    config: PdfRenderSettings,
}

impl PdfProcessor {
    /// Create a new PDF processor
    pub fn new(config: PdfRenderSettings) -> Result<Self, PdfError> {
        // Try a library next to the binary, then the usual install locations
        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
                })
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                        "/usr/local/lib",
                    ))
                })
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfError::InitError(format!("Could not find PDFium library: {}", e)))?,
        );

        Ok(Self { pdfium, config })
    }

    /// Load a PDF from bytes and render all pages to images
    pub fn render_pdf_bytes(&self, bytes: &[u8]) -> Result<Vec<RgbImage>, PdfError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PdfError::LoadError(e.to_string()))?;

        self.render_document(&document)
    }

    /// Render all pages of a PDF document to images
    fn render_document(&self, document: &PdfDocument) -> Result<Vec<RgbImage>, PdfError> {
        let page_count = document.pages().len();

        if page_count == 0 {
            return Err(PdfError::EmptyPdf);
        }

        let mut images = Vec::with_capacity(page_count as usize);
        for (index, page) in document.pages().iter().enumerate() {
            let image = self
                .render_page(&page)
                .map_err(|message| PdfError::RenderError {
                    page: index + 1,
                    message,
                })?;
            debug!("Rendered page {} at {}x{}", index + 1, image.width(), image.height());
            images.push(image);
        }

        Ok(images)
    }

    /// Render a single page to an RGB image
    fn render_page(&self, page: &PdfPage) -> Result<RgbImage, String> {
        let (width_px, height_px) = self
            .config
            .target_size(page.width().value, page.height().value);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| e.to_string())?;

        Ok(bitmap.as_image().to_rgb8())
    }
}

/// Check if bytes represent a PDF file (magic bytes: %PDF)
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"%PDF"
}

/// Check if a file path has a PDF extension
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_ascii_lowercase() == "pdf")
        .unwrap_or(false)
}

/// Reads the input document and produces its pages in order.
///
/// Every page is produced before the first one is recognized, so a broken
/// document fails the run before any output is written.
pub fn load_pages(
    path: &Path,
    render: &PdfRenderSettings,
    jpeg: Option<&JpegOptions>,
    pages_dir: Option<&Path>,
) -> Result<Vec<RgbImage>, PdfError> {
    let bytes = std::fs::read(path).map_err(|source| PdfError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let pages = if is_pdf_path(path) || is_pdf_bytes(&bytes) {
        info!("Rendering PDF pages from {}", path.display());
        PdfProcessor::new(render.clone())?.render_pdf_bytes(&bytes)?
    } else {
        info!("Treating {} as a single page image", path.display());
        let image = load_image_from_memory(&bytes).map_err(|source| PdfError::Page { page: 0, source })?;
        vec![image]
    };

    finish_pages(pages, jpeg, pages_dir)
}

/// Applies the JPEG cycle and the optional page dump.
fn finish_pages(
    pages: Vec<RgbImage>,
    jpeg: Option<&JpegOptions>,
    pages_dir: Option<&Path>,
) -> Result<Vec<RgbImage>, PdfError> {
    pages
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            let page = match jpeg {
                Some(options) => jpeg_round_trip(&page, options.quality)
                    .map_err(|source| PdfError::Page { page: index, source })?,
                None => page,
            };
            if let Some(dir) = pages_dir {
                let quality = jpeg.map(|options| options.quality).unwrap_or(JpegOptions::default().quality);
                save_jpeg(&page, &dir.join(format!("img-{}.jpeg", index)), quality)
                    .map_err(|source| PdfError::Page { page: index, source })?;
            }
            Ok(page)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf_bytes(b"%PDF-1.7\n"));
        assert!(!is_pdf_bytes(b"\xFF\xD8\xFF"));
        assert!(!is_pdf_bytes(b"%PD"));
        assert!(is_pdf_path(Path::new("scan.PDF")));
        assert!(!is_pdf_path(Path::new("scan.png")));
        assert!(!is_pdf_path(Path::new("scan")));
    }

    #[test]
    fn test_render_size_respects_dpi_and_cap() {
        let settings = PdfRenderSettings {
            dpi: 144.0,
            max_dimension: 4000,
        };
        // US letter, two pixels per point
        assert_eq!(settings.target_size(612.0, 792.0), (1224, 1584));

        let capped = PdfRenderSettings {
            dpi: 600.0,
            max_dimension: 1000,
        };
        let (w, h) = capped.target_size(612.0, 792.0);
        assert!(h <= 1000 && h >= 999, "{}", h);
        assert!(w < h);
    }

    #[test]
    fn test_single_image_input_with_page_dump() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.png");
        RgbImage::from_pixel(20, 10, Rgb([50, 100, 150]))
            .save(&input)
            .unwrap();
        let pages_dir = dir.path().join("temp");
        std::fs::create_dir(&pages_dir).unwrap();

        let jpeg = JpegOptions {
            quality: 90,
            progressive: true,
            optimize: true,
        };
        let pages = load_pages(
            &input,
            &PdfRenderSettings::default(),
            Some(&jpeg),
            Some(&pages_dir),
        )
        .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dimensions(), (20, 10));
        assert!(pages_dir.join("img-0.jpeg").is_file());
    }

    #[test]
    fn test_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pages(
            &dir.path().join("missing.pdf"),
            &PdfRenderSettings::default(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PdfError::Read { .. }));
    }
}
