//! IAT Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.

use thiserror::Error;

/// Main error type for IAT operations
#[derive(Debug, Error)]
pub enum IatError {
    /// Model/Inference errors
    #[error("Model Error: {0}")]
    Model(#[from] ModelError),
    /// Text pipeline errors
    #[error("Text Error: {0}")]
    Text(#[from] TextError),
    /// Node invocation errors
    #[error("Node Error: {0}")]
    Node(#[from] NodeError),
    /// File system errors
    #[error("File System Error: {0}")]
    FileSystem(#[from] std::io::Error),
    /// Configuration errors
    #[error("Config Error: {0}")]
    Config(String),
    /// Malformed JSON from the host or a model directory
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    /// Image encoding errors
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
}

/// Model/Inference errors
///
/// Cloneable so the provider can cache an unavailable outcome and hand the
/// same error to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{kind:?}] {message}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// `model.qwen_path` missing or empty
    NotConfigured,
    /// Resolved model path does not exist
    NotFound,
    /// Device identifier could not be turned into a device
    InvalidDevice,
    LoadFailed,
    InferenceFailed,
}

impl ModelError {
    pub fn not_configured() -> Self {
        Self {
            kind: ModelErrorKind::NotConfigured,
            message: "'model.qwen_path' not found in config.yaml. Please configure it.".into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn invalid_device(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::InvalidDevice,
            message: message.into(),
        }
    }

    pub fn load_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::LoadFailed,
            message: message.into(),
        }
    }

    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::InferenceFailed,
            message: message.into(),
        }
    }

    /// True for every outcome that leaves the provider without a model
    pub fn is_unavailable(&self) -> bool {
        !matches!(self.kind, ModelErrorKind::InferenceFailed)
    }
}

/// Message the nodes return when no model could be loaded
pub const MODEL_NOT_LOADED: &str = "[IAT] Qwen model not loaded. Check config.yaml and model path.";

/// Outcome of a failed text transformation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// The provider has no model (not configured, missing, or failed to load)
    #[error("model unavailable: {0}")]
    Unavailable(ModelError),
    /// Prompt rendering, inference, or decoding failed for this call
    #[error("generation failed: {0}")]
    Generation(String),
}

impl From<ModelError> for TextError {
    fn from(err: ModelError) -> Self {
        if err.is_unavailable() {
            TextError::Unavailable(err)
        } else {
            TextError::Generation(err.message)
        }
    }
}

impl TextError {
    /// Render for the host's single string output.
    ///
    /// `failure_prefix` is the node-specific label put in front of
    /// generation errors.
    pub fn host_message(&self, failure_prefix: &str) -> String {
        match self {
            TextError::Unavailable(_) => MODEL_NOT_LOADED.to_string(),
            TextError::Generation(msg) => format!("{}: {}", failure_prefix, msg),
        }
    }
}

/// Errors raised while invoking a node with host-provided inputs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("unknown node class '{0}'")]
    UnknownNode(String),
    #[error("missing required input '{0}'")]
    MissingInput(String),
    #[error("input '{name}' expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("input '{name}' value {value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("invalid node inputs: {0}")]
    InvalidInputs(String),
    #[error("image error: {0}")]
    Image(String),
}

/// Result type alias for IAT operations
pub type IatResult<T> = Result<T, IatError>;
