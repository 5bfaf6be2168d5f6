//! Plugin configuration
//!
//! Read once from `config.yaml` at the plugin root. A missing or broken
//! file leaves the defaults in place so the non-model nodes keep working.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::{IatError, IatResult};
use crate::hardware::DeviceSetting;
use crate::setup::paths::get_config_path;

/// Top-level config.yaml contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IatConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub model: ModelSettings,
}

/// The `model:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model directory, relative to the plugin root or absolute. No default.
    pub qwen_path: Option<String>,
    pub device: DeviceSetting,
    /// Try loading again after a failed attempt instead of staying unavailable
    pub retry_failed_load: bool,
    /// Seed for sampled generation
    pub seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            qwen_path: None,
            device: DeviceSetting::Auto,
            retry_failed_load: false,
            seed: 42,
        }
    }
}

impl ModelSettings {
    /// Configured model path with blank values treated as absent
    pub fn qwen_path(&self) -> Option<&str> {
        self.qwen_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

impl IatConfig {
    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> IatResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| IatError::Config(e.to_string()))
    }

    /// Load `config.yaml` from the plugin root, falling back to defaults
    pub fn load_from_dir(plugin_root: &Path) -> Self {
        let path = get_config_path(plugin_root);
        if !path.is_file() {
            info!(target: "iat::config", "No config file at {}, using defaults", path.display());
            return Self::default();
        }

        let loaded = std::fs::read_to_string(&path)
            .map_err(IatError::from)
            .and_then(|text| Self::from_yaml_str(&text));

        match loaded {
            Ok(config) => {
                info!(target: "iat::config", "Loaded {}", path.display());
                config
            }
            Err(e) => {
                warn!(target: "iat::config", "Failed to load config.yaml: {}", e);
                Self::default()
            }
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
