//! Plugin state: the context object and the model provider it owns.

pub mod context;
pub mod model_provider;

pub use context::PluginContext;
pub use model_provider::ModelProvider;
