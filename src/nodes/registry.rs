//! Node registry
//!
//! Maps host class keys to node implementations and runs invocations.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::NodeError;
use crate::nodes::image_nodes::{ImageMatchSize, ImageResizeLongestSide, ImageResizeToSdxl, ImageSize};
use crate::nodes::input_nodes::{Base64ToImage, FloatInput, IntInput, SeedGenerator, TextInput};
use crate::nodes::llm_nodes::{QwenKontextTranslator, QwenTranslator};
use crate::nodes::path_nodes::SmartPathBuilder;
use crate::nodes::schema::{NodeInputs, NodeSchema, NodeValue};
use crate::state::PluginContext;

/// A host-visible node
pub trait Node: Send + Sync {
    /// Declared inputs, outputs, and display metadata
    fn schema(&self) -> NodeSchema;

    /// Run with already validated inputs
    fn execute(&self, ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError>;
}

#[derive(Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<&'static str, Box<dyn Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every node the plugin ships
    pub fn with_builtin_nodes() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ImageMatchSize));
        registry.register(Box::new(ImageResizeLongestSide));
        registry.register(Box::new(ImageResizeToSdxl));
        registry.register(Box::new(ImageSize));
        registry.register(Box::new(SmartPathBuilder));
        registry.register(Box::new(Base64ToImage));
        registry.register(Box::new(FloatInput));
        registry.register(Box::new(IntInput));
        registry.register(Box::new(TextInput));
        registry.register(Box::new(SeedGenerator));
        registry.register(Box::new(QwenTranslator));
        registry.register(Box::new(QwenKontextTranslator));
        registry
    }

    /// Add a node; a later node with the same class key replaces the earlier one
    pub fn register(&mut self, node: Box<dyn Node>) {
        self.nodes.insert(node.schema().class_name, node);
    }

    pub fn get(&self, class_name: &str) -> Option<&dyn Node> {
        self.nodes.get(class_name).map(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Schemas sorted by class key
    pub fn schemas(&self) -> Vec<NodeSchema> {
        self.nodes.values().map(|n| n.schema()).collect()
    }

    /// Class key → display name
    pub fn display_name_mappings(&self) -> BTreeMap<&'static str, &'static str> {
        self.nodes
            .values()
            .map(|n| {
                let schema = n.schema();
                (schema.class_name, schema.display_name)
            })
            .collect()
    }

    /// Validate `inputs` against the node's schema and run it
    pub fn execute(&self, ctx: &PluginContext, class_name: &str, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let node = self
            .get(class_name)
            .ok_or_else(|| NodeError::UnknownNode(class_name.to_string()))?;
        inputs.validate(&node.schema())?;
        debug!(target: "iat::nodes", "Executing {}", class_name);
        node.execute(ctx, inputs)
    }

    /// Like [`execute`](Self::execute) with inputs given as a JSON object
    pub fn execute_json(&self, ctx: &PluginContext, class_name: &str, inputs: &Value) -> Result<Vec<NodeValue>, NodeError> {
        let node = self
            .get(class_name)
            .ok_or_else(|| NodeError::UnknownNode(class_name.to_string()))?;
        let inputs = NodeInputs::from_json(&node.schema(), inputs)?;
        self.execute(ctx, class_name, &inputs)
    }
}
