//! Provider Abstraction Layer
//!
//! Defines the generation and loading seams between the text pipeline and
//! the local model backend.

pub mod local;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::hardware::DeviceKind;

/// Upper bound on newly generated tokens for every node
pub const MAX_NEW_TOKENS: usize = 512;

/// Role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// How tokens are picked during generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Always take the most likely token
    Greedy,
    /// Sample from the temperature-scaled distribution
    Temperature(f64),
}

/// Per-call generation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub sampling: Sampling,
}

impl GenerationParams {
    pub fn greedy(max_new_tokens: usize) -> Self {
        Self {
            max_new_tokens,
            sampling: Sampling::Greedy,
        }
    }

    pub fn sampled(max_new_tokens: usize, temperature: f64) -> Self {
        Self {
            max_new_tokens,
            sampling: Sampling::Temperature(temperature),
        }
    }
}

/// A loaded model + tokenizer pair able to answer a chat prompt.
///
/// Implementations return only the newly generated text, with the prompt
/// prefix removed and special tokens skipped.
pub trait TextGenerator: Send + Sync {
    /// Name for logging/display
    fn name(&self) -> &str;

    /// Render `messages` through the chat template and generate a reply
    fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String, ModelError>;
}

/// Loads a [`TextGenerator`] from a model directory onto a device
pub trait ModelLoader: Send + Sync {
    fn load(&self, model_dir: &Path, device: DeviceKind, seed: u64) -> Result<Arc<dyn TextGenerator>, ModelError>;
}
