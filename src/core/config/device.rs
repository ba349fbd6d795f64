//! Device preference parsing and its mapping onto execution providers.

use super::errors::ConfigError;
use super::onnx::{OrtExecutionProvider, OrtSessionConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The devices a run may target.
///
/// Names follow the inference-engine device vocabulary (`CPU`, `GPU`, `FPGA`,
/// `MYRIAD`, `HETERO:FPGA,CPU`); anything else is rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DevicePreference {
    #[default]
    Cpu,
    Gpu,
    Fpga,
    Myriad,
    HeteroFpgaCpu,
}

impl DevicePreference {
    /// Every accepted device name, in the order shown to users.
    pub const ALLOWED: [&'static str; 5] = ["CPU", "GPU", "FPGA", "MYRIAD", "HETERO:FPGA,CPU"];

    /// Canonical device name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePreference::Cpu => "CPU",
            DevicePreference::Gpu => "GPU",
            DevicePreference::Fpga => "FPGA",
            DevicePreference::Myriad => "MYRIAD",
            DevicePreference::HeteroFpgaCpu => "HETERO:FPGA,CPU",
        }
    }

    /// Execution providers for this device, most preferred first.
    ///
    /// Accelerators always keep the CPU provider as the last entry so that
    /// operators the accelerator cannot run still have a home.
    pub fn execution_providers(&self) -> Vec<OrtExecutionProvider> {
        match self {
            DevicePreference::Cpu => vec![OrtExecutionProvider::CPU],
            DevicePreference::Gpu => vec![
                OrtExecutionProvider::CUDA { device_id: Some(0) },
                OrtExecutionProvider::CPU,
            ],
            DevicePreference::Fpga | DevicePreference::HeteroFpgaCpu => vec![
                OrtExecutionProvider::OpenVINO {
                    device_type: Some("HETERO:FPGA,CPU".to_string()),
                    num_threads: None,
                },
                OrtExecutionProvider::CPU,
            ],
            DevicePreference::Myriad => vec![
                OrtExecutionProvider::OpenVINO {
                    device_type: Some("MYRIAD_FP16".to_string()),
                    num_threads: None,
                },
                OrtExecutionProvider::CPU,
            ],
        }
    }

    /// Builds the session configuration for this device.
    pub fn session_config(&self) -> OrtSessionConfig {
        OrtSessionConfig::new().with_execution_providers(self.execution_providers())
    }
}

impl FromStr for DevicePreference {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CPU" => Ok(DevicePreference::Cpu),
            "GPU" => Ok(DevicePreference::Gpu),
            "FPGA" => Ok(DevicePreference::Fpga),
            "MYRIAD" => Ok(DevicePreference::Myriad),
            "HETERO:FPGA,CPU" => Ok(DevicePreference::HeteroFpgaCpu),
            _ => Err(ConfigError::DeviceNotAllowed {
                device: name.to_string(),
                allowed: Self::ALLOWED.join(", "),
            }),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
