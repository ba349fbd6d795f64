//! textspot: text spotting for scanned documents.
//!
//! Reads a PDF (or a single page image), runs every page through the
//! detector/encoder/decoder cascade and writes one line of text per page.
//!
//! # Usage
//!
//! ```bash
//! textspot -i scan.pdf -o scan.txt
//! textspot --options options.json -d GPU --threshold 0.6
//! ```
//!
//! `options.json` may carry `input`, `output` and `jpegopt`
//! (`{"quality": 95, "progressive": true, "optimize": true}`); command-line
//! values take precedence.

mod cli;
mod config;
mod pdf;

use clap::Parser;
use config::{JpegOptions, OptionsFile, RunConfig};
use pdf::PdfRenderSettings;
use std::path::PathBuf;
use textspot_ocr::core::config::{ConfigValidator, DevicePreference, ParallelPolicy};
use textspot_ocr::core::constants::{
    DEFAULT_ALPHABET, DEFAULT_DECODER_MODEL, DEFAULT_DETECTOR_MODEL, DEFAULT_ENCODER_MODEL,
    DEFAULT_MAX_DECODE_STEPS,
};
use textspot_ocr::domain::Alphabet;
use textspot_ocr::models::SymbolEncoding;
use textspot_ocr::processors::ColorOrder;
use textspot_ocr::spotter::TextSpotterConfig;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "textspot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract text from scanned documents with a text spotting cascade", long_about = None)]
struct Cli {
    /// JSON file with `input`, `output` and `jpegopt`
    #[arg(long, env = "TEXTSPOT_OPTIONS")]
    options: Option<PathBuf>,

    /// Input document (PDF or image)
    #[arg(short, long, env = "TEXTSPOT_INPUT")]
    input: Option<PathBuf>,

    /// Output text file, truncated at start
    #[arg(short, long, env = "TEXTSPOT_OUTPUT")]
    output: Option<PathBuf>,

    /// Text detector model
    #[arg(long = "detector", env = "TEXTSPOT_DETECTOR", default_value = DEFAULT_DETECTOR_MODEL)]
    detector_model: PathBuf,

    /// Recognizer encoder model
    #[arg(long = "encoder", env = "TEXTSPOT_ENCODER", default_value = DEFAULT_ENCODER_MODEL)]
    encoder_model: PathBuf,

    /// Recognizer decoder model
    #[arg(long = "decoder", env = "TEXTSPOT_DECODER", default_value = DEFAULT_DECODER_MODEL)]
    decoder_model: PathBuf,

    /// Custom operator library, if the models need one
    #[arg(short = 'c', long = "cpu-extension", env = "TEXTSPOT_CPU_EXTENSION")]
    cpu_extension: Option<PathBuf>,

    /// Device: CPU, GPU, FPGA, MYRIAD or HETERO:FPGA,CPU
    #[arg(short, long, env = "TEXTSPOT_DEVICE", default_value = "CPU")]
    device: DevicePreference,

    /// Detections must score above this to be decoded
    #[arg(long = "threshold", env = "TEXTSPOT_THRESHOLD", default_value_t = 0.5)]
    threshold: f32,

    /// Decoding alphabet; the first two characters stand for the start and end markers
    #[arg(long, env = "TEXTSPOT_LETTERS", default_value = DEFAULT_ALPHABET)]
    letters: Alphabet,

    /// Maximum decoder steps per region
    #[arg(long, env = "TEXTSPOT_MAX_STEPS", default_value_t = DEFAULT_MAX_DECODE_STEPS)]
    max_steps: usize,

    /// Channel order fed to the detector (BGR or RGB)
    #[arg(long, env = "TEXTSPOT_COLOR_ORDER", default_value = "BGR")]
    color_order: ColorOrder,

    /// Element type of the decoder's symbol input (f32 or i64)
    #[arg(long, env = "TEXTSPOT_SYMBOL_ENCODING", default_value = "f32")]
    symbol_encoding: SymbolEncoding,

    /// Detector input height, for models with a dynamic input shape
    #[arg(long, requires = "input_width")]
    input_height: Option<u32>,

    /// Detector input width, for models with a dynamic input shape
    #[arg(long, requires = "input_height")]
    input_width: Option<u32>,

    /// Decoder hidden state shape, comma separated (e.g. 1,1,1024)
    #[arg(long, value_delimiter = ',')]
    hidden_shape: Option<Vec<usize>>,

    /// JPEG quality for rasterized pages; overrides `jpegopt.quality`
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Directory to dump rasterized pages into as img-N.jpeg
    #[arg(long, env = "TEXTSPOT_PAGES_DIR")]
    pages_dir: Option<PathBuf>,

    /// PDF rendering resolution
    #[arg(long, default_value_t = 200.0)]
    dpi: f32,

    /// Cap on the rendered page's longer side, in pixels
    #[arg(long, default_value_t = 4000)]
    max_dimension: u32,

    /// Decode regions in parallel on pages with more than this many regions
    #[arg(long, env = "TEXTSPOT_PARALLEL_ABOVE")]
    parallel_above: Option<usize>,

    /// Worker threads for parallel decoding
    #[arg(long, env = "TEXTSPOT_THREADS")]
    threads: Option<usize>,
}

impl Cli {
    fn into_run_config(self) -> Result<RunConfig, cli::AppError> {
        let parallel = self
            .parallel_above
            .map(ParallelPolicy::parallel_above)
            .unwrap_or_default()
            .with_max_threads(self.threads);
        let spotter = TextSpotterConfig {
            probability_threshold: self.threshold,
            max_decode_steps: self.max_steps,
            color_order: self.color_order,
            symbol_encoding: self.symbol_encoding,
            detector_input_size: self.input_height.zip(self.input_width),
            resize_target: None,
            hidden_shape: self.hidden_shape,
            parallel,
        };

        let config = RunConfig {
            input: self.input,
            output: self.output,
            detector_model: self.detector_model,
            encoder_model: self.encoder_model,
            decoder_model: self.decoder_model,
            device: self.device,
            cpu_extension: self.cpu_extension,
            alphabet: self.letters,
            jpeg: None,
            pages_dir: self.pages_dir,
            render: PdfRenderSettings {
                dpi: self.dpi,
                max_dimension: self.max_dimension,
            },
            spotter,
        };

        let mut config = match &self.options {
            Some(path) => config.merge_options(OptionsFile::load(path)?),
            None => config,
        };
        if let Some(quality) = self.jpeg_quality {
            let jpeg = config.jpeg.get_or_insert_with(JpegOptions::default);
            jpeg.quality = quality;
        }
        Ok(config)
    }
}

fn main() {
    textspot_ocr::utils::init_tracing();

    let cli = Cli::parse();
    let config = match cli.into_run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {}", e);
        std::process::exit(1);
    }

    match cli::run(&config) {
        Ok(summary) => info!(
            "Done: {} pages, {} of {} detections decoded",
            summary.pages, summary.regions, summary.detections
        ),
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["textspot", "-i", "doc.pdf", "-o", "out.txt"]).unwrap();
        let config = cli.into_run_config().unwrap();
        assert_eq!(config.device, DevicePreference::Cpu);
        assert_eq!(config.alphabet, Alphabet::default());
        assert_eq!(config.spotter.probability_threshold, 0.5);
        assert_eq!(config.spotter.max_decode_steps, 28);
        assert_eq!(config.detector_model, PathBuf::from(DEFAULT_DETECTOR_MODEL));
        assert!(config.jpeg.is_none());
        assert!(!config.spotter.parallel.use_parallel(1000));
    }

    #[test]
    fn test_device_allow_list() {
        let parsed = Cli::try_parse_from(["textspot", "-d", "HETERO:FPGA,CPU"]).unwrap();
        assert_eq!(parsed.device, DevicePreference::HeteroFpgaCpu);
        assert!(Cli::try_parse_from(["textspot", "-d", "TPU"]).is_err());
    }

    #[test]
    fn test_shape_overrides() {
        let cli = Cli::try_parse_from([
            "textspot",
            "--input-height",
            "768",
            "--input-width",
            "1280",
            "--hidden-shape",
            "1,1,1024",
        ])
        .unwrap();
        let config = cli.into_run_config().unwrap();
        assert_eq!(config.spotter.detector_input_size, Some((768, 1280)));
        assert_eq!(config.spotter.hidden_shape, Some(vec![1, 1, 1024]));
        assert!(Cli::try_parse_from(["textspot", "--input-height", "768"]).is_err());
    }

    #[test]
    fn test_command_line_overrides_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("options.json");
        std::fs::write(
            &options,
            r#"{"input": "a.pdf", "output": "a.txt", "jpegopt": {"quality": 60, "progressive": true}}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "textspot",
            "--options",
            options.to_str().unwrap(),
            "-o",
            "b.txt",
            "--jpeg-quality",
            "95",
        ])
        .unwrap();
        let config = cli.into_run_config().unwrap();
        assert_eq!(config.input, Some(PathBuf::from("a.pdf")));
        assert_eq!(config.output, Some(PathBuf::from("b.txt")));
        let jpeg = config.jpeg.unwrap();
        assert_eq!(jpeg.quality, 95);
        assert!(jpeg.progressive);
    }

    #[test]
    fn test_invalid_threshold_fails_validation() {
        let cli = Cli::try_parse_from(["textspot", "-i", "x.pdf", "-o", "y.txt", "--threshold", "1.5"])
            .unwrap();
        let config = cli.into_run_config().unwrap();
        assert!(config.validate().is_err());
    }
}
