//! Host Nodes
//!
//! Every node the plugin exposes, its declared schema, and the registry the
//! host queries.

pub mod image_nodes;
pub mod input_nodes;
pub mod llm_nodes;
pub mod path_nodes;
pub mod registry;
pub mod schema;

pub use registry::{Node, NodeRegistry};
pub use schema::{InputSpec, NodeInputs, NodeSchema, NodeValue, OutputSpec, ValueType};
