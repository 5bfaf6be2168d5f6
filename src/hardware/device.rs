//! Compute device selection
//!
//! `auto` picks the first available accelerator (CUDA, then Metal) and
//! falls back to the CPU. Anything else is taken as an explicit device.

use candle_core::Device;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;

/// `model.device` as written in config.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceSetting {
    Auto,
    Explicit(String),
}

impl Default for DeviceSetting {
    fn default() -> Self {
        DeviceSetting::Auto
    }
}

impl From<String> for DeviceSetting {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            DeviceSetting::Auto
        } else {
            DeviceSetting::Explicit(trimmed.to_string())
        }
    }
}

impl From<DeviceSetting> for String {
    fn from(setting: DeviceSetting) -> Self {
        match setting {
            DeviceSetting::Auto => "auto".to_string(),
            DeviceSetting::Explicit(name) => name,
        }
    }
}

/// Device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl DeviceKind {
    pub fn as_string(&self) -> String {
        match self {
            DeviceKind::Cpu => "cpu".to_string(),
            DeviceKind::Cuda(ordinal) => format!("cuda:{}", ordinal),
            DeviceKind::Metal(ordinal) => format!("metal:{}", ordinal),
        }
    }

    /// Parse an explicit identifier such as `cpu`, `cuda`, `cuda:1`, `mps`
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, ordinal) = match lower.split_once(':') {
            Some((base, idx)) => {
                let ordinal = idx
                    .parse::<usize>()
                    .map_err(|_| ModelError::invalid_device(format!("Invalid device index in '{}'", name)))?;
                (base.to_string(), ordinal)
            }
            None => (lower.clone(), 0),
        };

        match base.as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "cuda" | "gpu" => Ok(DeviceKind::Cuda(ordinal)),
            "metal" | "mps" => Ok(DeviceKind::Metal(ordinal)),
            _ => Err(ModelError::invalid_device(format!("Unknown device '{}'", name))),
        }
    }

    /// Materialize the candle device
    pub fn open(&self) -> Result<Device, ModelError> {
        let device = match self {
            DeviceKind::Cpu => Ok(Device::Cpu),
            DeviceKind::Cuda(ordinal) => Device::new_cuda(*ordinal),
            DeviceKind::Metal(ordinal) => Device::new_metal(*ordinal),
        };
        device.map_err(|e| ModelError::invalid_device(format!("Failed to open {}: {}", self.as_string(), e)))
    }
}

/// Detect best available accelerator, CPU when there is none
pub fn detect_accelerator() -> DeviceKind {
    #[cfg(feature = "cuda")]
    {
        if candle_core::utils::cuda_is_available() {
            return DeviceKind::Cuda(0);
        }
    }

    #[cfg(all(feature = "metal", target_os = "macos"))]
    {
        if candle_core::utils::metal_is_available() {
            return DeviceKind::Metal(0);
        }
    }

    DeviceKind::Cpu
}

/// Resolve the configured setting to a concrete device kind
pub fn select_device(setting: &DeviceSetting) -> Result<DeviceKind, ModelError> {
    let kind = match setting {
        DeviceSetting::Auto => detect_accelerator(),
        DeviceSetting::Explicit(name) => DeviceKind::parse(name)?,
    };
    debug!(target: "iat::device", "Device setting {:?} resolved to {}", setting, kind.as_string());
    Ok(kind)
}
