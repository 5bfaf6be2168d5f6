//! IAT: image and text utility nodes with a local Qwen translator and
//! Flux Kontext prompt optimizer.
//!
//! [`Plugin::load`] reads `config.yaml` from the plugin root and builds the
//! node registry plus the shared context. The Qwen model is loaded on the
//! first text node invocation, not at plugin load.

pub mod bitmap;
pub mod error;
pub mod hardware;
pub mod nodes;
pub mod providers;
pub mod setup;
pub mod state;
pub mod text;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use tracing::{info, warn};

pub use error::{IatError, IatResult, ModelError, NodeError, TextError};
pub use nodes::{Node, NodeInputs, NodeRegistry, NodeSchema, NodeValue};
pub use state::{ModelProvider, PluginContext};

/// Plugin version reported to the host
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A loaded plugin: its nodes and the state they share
pub struct Plugin {
    context: PluginContext,
    registry: NodeRegistry,
}

impl Plugin {
    /// Read config.yaml under `plugin_root` and register every node
    pub fn load(plugin_root: impl Into<PathBuf>) -> Self {
        let context = PluginContext::load(plugin_root);
        Self::with_context(context)
    }

    pub fn with_context(context: PluginContext) -> Self {
        let registry = NodeRegistry::with_builtin_nodes();
        if registry.is_empty() {
            warn!(target: "iat::nodes", "v{} No nodes loaded", VERSION);
        } else {
            info!(target: "iat::nodes", "v{} Loaded {} nodes", VERSION, registry.len());
        }
        Self { context, registry }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Run one node by class key
    pub fn execute(&self, class_name: &str, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        self.registry.execute(&self.context, class_name, inputs)
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` level. Safe to call more than once.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
