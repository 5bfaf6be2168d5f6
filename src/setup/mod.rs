//! Setup Module
//!
//! Plugin root paths and the config.yaml loader.

pub mod config;
pub mod paths;

pub use config::{IatConfig, ModelSettings};
