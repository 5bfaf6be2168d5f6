use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::providers::ModelLoader;
use crate::setup::IatConfig;
use crate::state::model_provider::ModelProvider;

/// Long-lived state shared by every node invocation of one plugin instance
pub struct PluginContext {
    plugin_root: PathBuf,
    config: IatConfig,
    models: Arc<ModelProvider>,
}

impl PluginContext {
    /// Create a context with the default Qwen loader
    pub fn new(config: IatConfig, plugin_root: impl Into<PathBuf>) -> Self {
        let plugin_root = plugin_root.into();
        let models = ModelProvider::new(config.model.clone(), plugin_root.clone());
        Self {
            plugin_root,
            config,
            models: Arc::new(models),
        }
    }

    /// Create a context whose provider uses `loader`
    pub fn with_loader(config: IatConfig, plugin_root: impl Into<PathBuf>, loader: Box<dyn ModelLoader>) -> Self {
        let plugin_root = plugin_root.into();
        let models = ModelProvider::with_loader(config.model.clone(), plugin_root.clone(), loader);
        Self {
            plugin_root,
            config,
            models: Arc::new(models),
        }
    }

    /// Read config.yaml under `plugin_root` and build the context
    pub fn load(plugin_root: impl Into<PathBuf>) -> Self {
        let plugin_root = plugin_root.into();
        let config = IatConfig::load_from_dir(&plugin_root);
        Self::new(config, plugin_root)
    }

    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    pub fn config(&self) -> &IatConfig {
        &self.config
    }

    /// Shared model provider
    pub fn models(&self) -> &Arc<ModelProvider> {
        &self.models
    }
}
