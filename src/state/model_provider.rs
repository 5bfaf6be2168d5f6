//! Lazy, memoized model provider
//!
//! Owns the one (model, tokenizer) pair of a plugin context. The first
//! `get_model` call loads it; later calls get the cached handle or the
//! cached unavailable reason.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::error::ModelError;
use crate::hardware::select_device;
use crate::providers::local::QwenLoader;
use crate::providers::{ModelLoader, TextGenerator};
use crate::setup::paths::resolve_model_path;
use crate::setup::ModelSettings;

/// Provider state
#[derive(Clone)]
enum LoadState {
    Unloaded,
    Ready(Arc<dyn TextGenerator>),
    Unavailable(ModelError),
}

pub struct ModelProvider {
    settings: ModelSettings,
    plugin_root: PathBuf,
    loader: Box<dyn ModelLoader>,
    // Held across the whole load so concurrent first use loads once.
    state: Mutex<LoadState>,
}

impl ModelProvider {
    /// Create a provider backed by the Candle Qwen loader
    pub fn new(settings: ModelSettings, plugin_root: impl Into<PathBuf>) -> Self {
        Self::with_loader(settings, plugin_root, Box::new(QwenLoader))
    }

    /// Create a provider with a custom loader
    pub fn with_loader(settings: ModelSettings, plugin_root: impl Into<PathBuf>, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            settings,
            plugin_root: plugin_root.into(),
            loader,
            state: Mutex::new(LoadState::Unloaded),
        }
    }

    /// Return the cached model, loading it on first use.
    ///
    /// An `Err` is the unavailable outcome: not configured, path missing,
    /// or load failure. Unless `retry_failed_load` is set it is returned
    /// for the lifetime of the provider without another attempt.
    pub fn get_model(&self) -> Result<Arc<dyn TextGenerator>, ModelError> {
        let mut state = self.state.lock();

        match &*state {
            LoadState::Ready(model) => return Ok(model.clone()),
            LoadState::Unavailable(err) if !self.settings.retry_failed_load => return Err(err.clone()),
            _ => {}
        }

        let outcome = self.load();
        *state = match &outcome {
            Ok(model) => LoadState::Ready(model.clone()),
            Err(err) => LoadState::Unavailable(err.clone()),
        };
        outcome
    }

    /// Check if model is loaded
    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), LoadState::Ready(_))
    }

    /// The error of the last failed attempt, if the provider is unavailable
    pub fn unavailable_reason(&self) -> Option<ModelError> {
        match &*self.state.lock() {
            LoadState::Unavailable(err) => Some(err.clone()),
            _ => None,
        }
    }

    fn load(&self) -> Result<Arc<dyn TextGenerator>, ModelError> {
        let Some(configured) = self.settings.qwen_path() else {
            let err = ModelError::not_configured();
            error!(target: "iat::model", "{}", err.message);
            return Err(err);
        };

        let model_path = resolve_model_path(&self.plugin_root, configured);
        if !model_path.exists() {
            let err = ModelError::not_found(format!("Model not found at configured path: {}", model_path.display()));
            error!(target: "iat::model", "{}", err.message);
            return Err(err);
        }

        let loaded = select_device(&self.settings.device).and_then(|device| {
            info!(target: "iat::model", "Loading Qwen model from: {}", model_path.display());
            info!(target: "iat::model", "Using device: {}", device.as_string());
            self.loader.load(&model_path, device, self.settings.seed)
        });

        match loaded {
            Ok(model) => {
                info!(target: "iat::model", "Qwen model loaded successfully.");
                Ok(model)
            }
            Err(e) => {
                let err = ModelError::load_failed(format!("Failed to load Qwen model: {}", e.message));
                error!(target: "iat::model", "{}", err.message);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelErrorKind;
    use crate::hardware::{DeviceKind, DeviceSetting};
    use crate::providers::{ChatMessage, GenerationParams};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct EchoModel;

    impl TextGenerator for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        fn generate(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String, ModelError> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    /// Counts load calls; fails until `fail_times` attempts have been made
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_times: usize,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self, _dir: &Path, device: DeviceKind, _seed: u64) -> Result<Arc<dyn TextGenerator>, ModelError> {
            assert_eq!(device, DeviceKind::Cpu);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(ModelError::load_failed("corrupt weights"))
            } else {
                Ok(Arc::new(EchoModel))
            }
        }
    }

    fn settings(path: Option<&str>, retry: bool) -> ModelSettings {
        ModelSettings {
            qwen_path: path.map(str::to_string),
            device: DeviceSetting::Explicit("cpu".into()),
            retry_failed_load: retry,
            ..ModelSettings::default()
        }
    }

    fn provider(root: &Path, path: Option<&str>, retry: bool, fail_times: usize) -> (ModelProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            calls: calls.clone(),
            fail_times,
        };
        (ModelProvider::with_loader(settings(path, retry), root, Box::new(loader)), calls)
    }

    #[test]
    fn test_loads_once_and_caches() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("qwen")).unwrap();
        let (provider, calls) = provider(root.path(), Some("qwen"), false, 0);

        let first = provider.get_model().unwrap();
        let second = provider.get_model().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(provider.is_loaded());
    }

    #[test]
    fn test_missing_config_path_is_unavailable() {
        let root = tempdir().unwrap();
        let (provider, calls) = provider(root.path(), None, false, 0);

        let err = provider.get_model().err().unwrap();
        assert_eq!(err.kind, ModelErrorKind::NotConfigured);
        let again = provider.get_model().err().unwrap();
        assert_eq!(again, err);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!provider.is_loaded());
    }

    #[test]
    fn test_nonexistent_path_is_unavailable() {
        let root = tempdir().unwrap();
        let (provider, calls) = provider(root.path(), Some("models/missing"), false, 0);

        let err = provider.get_model().err().unwrap();
        assert_eq!(err.kind, ModelErrorKind::NotFound);
        assert!(err.message.contains("missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_load_is_not_retried_by_default() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("qwen")).unwrap();
        let (provider, calls) = provider(root.path(), Some("qwen"), false, 1);

        assert_eq!(provider.get_model().err().unwrap().kind, ModelErrorKind::LoadFailed);
        assert!(provider.get_model().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(provider.unavailable_reason().is_some());
    }

    #[test]
    fn test_retry_policy_reattempts_failed_load() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("qwen")).unwrap();
        let (provider, calls) = provider(root.path(), Some("qwen"), true, 1);

        assert!(provider.get_model().is_err());
        assert!(provider.get_model().is_ok());
        assert!(provider.get_model().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_device_becomes_load_failure() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("qwen")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut settings = settings(Some("qwen"), false);
        settings.device = DeviceSetting::Explicit("quantum".into());
        let provider = ModelProvider::with_loader(
            settings,
            root.path(),
            Box::new(CountingLoader {
                calls: calls.clone(),
                fail_times: 0,
            }),
        );

        assert_eq!(provider.get_model().err().unwrap().kind, ModelErrorKind::LoadFailed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("qwen")).unwrap();
        let (provider, calls) = provider(root.path(), Some("qwen"), false, 0);
        let provider = Arc::new(provider);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                std::thread::spawn(move || provider.get_model().is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
