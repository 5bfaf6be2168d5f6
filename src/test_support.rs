//! Stub model backends for unit tests

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ModelError;
use crate::hardware::{DeviceKind, DeviceSetting};
use crate::providers::{ChatMessage, GenerationParams, ModelLoader, TextGenerator};
use crate::setup::{IatConfig, ModelSettings};
use crate::state::PluginContext;

/// Returns a fixed reply and records every request
pub struct ScriptedModel {
    reply: Result<String, ModelError>,
    pub requests: Mutex<Vec<(Vec<ChatMessage>, GenerationParams)>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(ModelError::inference_failed(message)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl TextGenerator for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String, ModelError> {
        self.requests.lock().push((messages.to_vec(), *params));
        self.reply.clone()
    }
}

/// Hands out the same scripted model on every load
pub struct ScriptedLoader(pub Arc<ScriptedModel>);

impl ModelLoader for ScriptedLoader {
    fn load(&self, _dir: &Path, _device: DeviceKind, _seed: u64) -> Result<Arc<dyn TextGenerator>, ModelError> {
        Ok(self.0.clone())
    }
}

/// Context whose model directory exists under a temp root and whose
/// provider serves `model`
pub fn scripted_context(root: &Path, model: Arc<ScriptedModel>) -> PluginContext {
    std::fs::create_dir_all(root.join("models/qwen")).expect("create model dir");
    let config = IatConfig {
        model: ModelSettings {
            qwen_path: Some("models/qwen".into()),
            device: DeviceSetting::Explicit("cpu".into()),
            ..ModelSettings::default()
        },
    };
    PluginContext::with_loader(config, root, Box::new(ScriptedLoader(model)))
}

/// Context without a configured model
pub fn unconfigured_context(root: &Path) -> PluginContext {
    PluginContext::new(IatConfig::default(), root)
}
