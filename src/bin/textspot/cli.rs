//! The three tasks of a run: load the models, rasterize the input, recognize
//! every page into the output file.

use crate::config::RunConfig;
use crate::pdf::{load_pages, PdfError};
use std::time::Instant;
use textspot_ocr::core::config::ConfigError;
use textspot_ocr::spotter::{ResultWriter, TextSpotterBuilder};
use textspot_ocr::OCRError;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("input document: {0}")]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Ocr(#[from] OCRError),
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub pages: usize,
    pub regions: usize,
    pub detections: usize,
}

/// Runs the cascade over the whole input. `config` must already be validated.
pub fn run(config: &RunConfig) -> Result<RunSummary, AppError> {
    let start = Instant::now();
    let input = config.input_path()?;
    let output = config.output_path()?;
    // Truncated at run start.
    let mut writer = ResultWriter::create(output)?;

    info!("TASK 1 of 3: Load the models");
    if let Err(e) = config.spotter.parallel.install_global_thread_pool() {
        warn!("Keeping the existing rayon thread pool: {}", e);
    }
    let spotter = TextSpotterBuilder::new(
        &config.detector_model,
        &config.encoder_model,
        &config.decoder_model,
    )
    .alphabet(config.alphabet.clone())
    .ort_session(config.session_config())
    .config(config.spotter.clone())
    .build()?;
    info!(
        "Models loaded on {} in {:.2}ms",
        config.device,
        start.elapsed().as_secs_f64() * 1000.0
    );

    info!("TASK 2 of 3: Rasterize {}", input.display());
    if let Some(jpeg) = &config.jpeg {
        info!(
            "JPEG pages at quality {} (progressive: {}, optimize: {})",
            jpeg.quality, jpeg.progressive, jpeg.optimize
        );
    }
    let raster_start = Instant::now();
    let pages = load_pages(
        input,
        &config.render,
        config.jpeg.as_ref(),
        config.pages_dir.as_deref(),
    )?;
    info!(
        "Produced {} pages in {:.2}ms",
        pages.len(),
        raster_start.elapsed().as_secs_f64() * 1000.0
    );

    info!("TASK 3 of 3: Recognize text into {}", output.display());
    let mut summary = RunSummary::default();
    for (index, page) in pages.into_iter().enumerate() {
        let page_start = Instant::now();
        let result = spotter.process_page(index, &page)?;
        drop(page);
        writer.write_page(&result)?;

        summary.pages += 1;
        summary.regions += result.len();
        summary.detections += result.detection_count;
        info!(
            "Page {}: {} of {} regions recognized in {:.2}ms",
            index + 1,
            result.len(),
            result.detection_count,
            page_start.elapsed().as_secs_f64() * 1000.0
        );
    }

    info!(
        "Wrote {} pages ({} regions) to {} in {:.2}s",
        writer.pages_written(),
        summary.regions,
        output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfRenderSettings;
    use textspot_ocr::core::config::DevicePreference;
    use textspot_ocr::domain::Alphabet;
    use textspot_ocr::spotter::TextSpotterConfig;

    #[test]
    fn test_output_truncated_before_models_load() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc.pdf", "det.onnx", "enc.onnx", "dec.onnx"] {
            std::fs::write(dir.path().join(name), b"not a model").unwrap();
        }
        let output = dir.path().join("out.txt");
        std::fs::write(&output, "previous run\n\n").unwrap();

        let config = RunConfig {
            input: Some(dir.path().join("doc.pdf")),
            output: Some(output.clone()),
            detector_model: dir.path().join("det.onnx"),
            encoder_model: dir.path().join("enc.onnx"),
            decoder_model: dir.path().join("dec.onnx"),
            device: DevicePreference::Cpu,
            cpu_extension: None,
            alphabet: Alphabet::default(),
            jpeg: None,
            pages_dir: None,
            render: PdfRenderSettings::default(),
            spotter: TextSpotterConfig::default(),
        };

        assert!(run(&config).is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }
}
