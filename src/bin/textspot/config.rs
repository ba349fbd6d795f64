//! Run configuration: command-line values merged with `options.json`.

use crate::pdf::PdfRenderSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use textspot_ocr::core::config::{
    ConfigError, ConfigValidator, DevicePreference, OrtSessionConfig,
};
use textspot_ocr::domain::Alphabet;
use textspot_ocr::spotter::TextSpotterConfig;

/// JPEG settings applied to rasterized pages.
///
/// `progressive` and `optimize` change the encoded file, not the decoded
/// pixels, so they are accepted for compatibility and only logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegOptions {
    pub quality: u8,
    pub progressive: bool,
    pub optimize: bool,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            quality: 75,
            progressive: false,
            optimize: false,
        }
    }
}

/// Contents of an options file.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsFile {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub jpegopt: Option<JpegOptions>,
}

impl OptionsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::OptionsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::OptionsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Everything a run needs, fixed before the first model is loaded.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub detector_model: PathBuf,
    pub encoder_model: PathBuf,
    pub decoder_model: PathBuf,
    pub device: DevicePreference,
    pub cpu_extension: Option<PathBuf>,
    pub alphabet: Alphabet,
    pub jpeg: Option<JpegOptions>,
    pub pages_dir: Option<PathBuf>,
    pub render: PdfRenderSettings,
    pub spotter: TextSpotterConfig,
}

impl RunConfig {
    /// Fills `input`, `output` and `jpeg` from `options` where the command
    /// line left them unset.
    pub fn merge_options(mut self, options: OptionsFile) -> Self {
        self.input = self.input.or(options.input);
        self.output = self.output.or(options.output);
        self.jpeg = self.jpeg.or(options.jpegopt);
        self
    }

    pub fn input_path(&self) -> Result<&Path, ConfigError> {
        self.input
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "input" })
    }

    pub fn output_path(&self) -> Result<&Path, ConfigError> {
        self.output
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "output" })
    }

    /// Session settings shared by the three models.
    pub fn session_config(&self) -> OrtSessionConfig {
        let config = self.device.session_config();
        match &self.cpu_extension {
            Some(path) => config.with_operator_library(path),
            None => config,
        }
    }
}

impl ConfigValidator for RunConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let input = self.input_path()?;
        let output = self.output_path()?;

        self.spotter.validate()?;
        if let Some(jpeg) = &self.jpeg {
            if jpeg.quality > 100 {
                return Err(ConfigError::OutOfRange {
                    field: "jpegopt.quality",
                    range: "[0, 100]",
                    value: jpeg.quality.to_string(),
                });
            }
        }
        if self.render.dpi.is_nan() || self.render.dpi <= 0.0 || self.render.max_dimension == 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "render settings must be positive, got dpi {} and max dimension {}",
                    self.render.dpi, self.render.max_dimension
                ),
            });
        }

        self.validate_file_path("input document", input)?;
        self.validate_file_path("detector model", &self.detector_model)?;
        self.validate_file_path("encoder model", &self.encoder_model)?;
        self.validate_file_path("decoder model", &self.decoder_model)?;
        if let Some(extension) = &self.cpu_extension {
            self.validate_file_path("cpu extension", extension)?;
        }

        let output_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !output_dir.is_dir() {
            return Err(ConfigError::PathNotFound {
                what: "output directory",
                path: output_dir.to_path_buf(),
            });
        }
        if let Some(dir) = &self.pages_dir {
            if !dir.is_dir() {
                return Err(ConfigError::PathNotFound {
                    what: "pages directory",
                    path: dir.clone(),
                });
            }
        }

        Ok(())
    }
}
