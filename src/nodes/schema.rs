//! Node contract types
//!
//! What a node declares to the host (typed inputs with widget hints, typed
//! outputs, category, display name) and the values that flow through it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bitmap::ImageTensor;
use crate::error::NodeError;

/// Socket/widget type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    String,
    Int,
    Float,
    Boolean,
    Image,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "STRING",
            ValueType::Int => "INT",
            ValueType::Float => "FLOAT",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Image => "IMAGE",
        }
    }
}

/// A value passed into or out of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum NodeValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Image(ImageTensor),
}

impl NodeValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            NodeValue::String(_) => ValueType::String,
            NodeValue::Int(_) => ValueType::Int,
            NodeValue::Float(_) => ValueType::Float,
            NodeValue::Boolean(_) => ValueType::Boolean,
            NodeValue::Image(_) => ValueType::Image,
        }
    }
}

/// One declared input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<&'static str>,
}

impl InputSpec {
    fn new(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            default: None,
            min: None,
            max: None,
            step: None,
            multiline: false,
            tooltip: None,
        }
    }

    pub fn string(name: &'static str, default: &str) -> Self {
        Self {
            default: Some(Value::from(default)),
            ..Self::new(name, ValueType::String)
        }
    }

    pub fn int(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            default: Some(Value::from(default)),
            min: Some(min as f64),
            max: Some(max as f64),
            ..Self::new(name, ValueType::Int)
        }
    }

    pub fn float(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            default: Some(Value::from(default)),
            min: Some(min),
            max: Some(max),
            ..Self::new(name, ValueType::Float)
        }
    }

    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            default: Some(Value::from(default)),
            ..Self::new(name, ValueType::Boolean)
        }
    }

    pub fn image(name: &'static str) -> Self {
        Self::new(name, ValueType::Image)
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn tooltip(mut self, tooltip: &'static str) -> Self {
        self.tooltip = Some(tooltip);
        self
    }
}

/// One declared output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub name: &'static str,
    pub value_type: ValueType,
}

impl OutputSpec {
    pub fn new(name: &'static str, value_type: ValueType) -> Self {
        Self { name, value_type }
    }
}

/// Everything the host needs to show and wire a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSchema {
    pub class_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub function: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

/// Named input values for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInputs {
    values: HashMap<String, NodeValue>,
}

impl NodeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: NodeValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: NodeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> Result<&NodeValue, NodeError> {
        self.values
            .get(name)
            .ok_or_else(|| NodeError::MissingInput(name.to_string()))
    }

    fn mismatch(name: &str, expected: ValueType, actual: &NodeValue) -> NodeError {
        NodeError::TypeMismatch {
            name: name.to_string(),
            expected: expected.as_str(),
            actual: actual.value_type().as_str(),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, NodeError> {
        match self.require(name)? {
            NodeValue::String(s) => Ok(s),
            other => Err(Self::mismatch(name, ValueType::String, other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, NodeError> {
        match self.require(name)? {
            NodeValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(name, ValueType::Int, other)),
        }
    }

    /// Integers are accepted where a float is declared
    pub fn float(&self, name: &str) -> Result<f64, NodeError> {
        match self.require(name)? {
            NodeValue::Float(v) => Ok(*v),
            NodeValue::Int(v) => Ok(*v as f64),
            other => Err(Self::mismatch(name, ValueType::Float, other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, NodeError> {
        match self.require(name)? {
            NodeValue::Boolean(v) => Ok(*v),
            other => Err(Self::mismatch(name, ValueType::Boolean, other)),
        }
    }

    pub fn image(&self, name: &str) -> Result<&ImageTensor, NodeError> {
        match self.require(name)? {
            NodeValue::Image(img) => Ok(img),
            other => Err(Self::mismatch(name, ValueType::Image, other)),
        }
    }

    /// Check presence, type, and declared range of every input
    pub fn validate(&self, schema: &NodeSchema) -> Result<(), NodeError> {
        for spec in &schema.inputs {
            let number = match spec.value_type {
                ValueType::String => {
                    self.string(spec.name)?;
                    None
                }
                ValueType::Int => Some(self.int(spec.name)? as f64),
                ValueType::Float => Some(self.float(spec.name)?),
                ValueType::Boolean => {
                    self.boolean(spec.name)?;
                    None
                }
                ValueType::Image => {
                    self.image(spec.name)?;
                    None
                }
            };

            if let Some(value) = number {
                let min = spec.min.unwrap_or(f64::NEG_INFINITY);
                let max = spec.max.unwrap_or(f64::INFINITY);
                if value < min || value > max {
                    return Err(NodeError::OutOfRange {
                        name: spec.name.to_string(),
                        value,
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Build inputs from a JSON object of plain values, filling declared
    /// defaults for missing keys. Images use the serialized
    /// [`ImageTensor`] layout.
    pub fn from_json(schema: &NodeSchema, json: &Value) -> Result<Self, NodeError> {
        let empty = serde_json::Map::new();
        let object = match json {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(NodeError::InvalidInputs("expected a JSON object".into())),
        };

        let mut inputs = Self::new();
        for spec in &schema.inputs {
            let Some(raw) = object.get(spec.name).or(spec.default.as_ref()) else {
                continue;
            };
            let mismatch = || NodeError::TypeMismatch {
                name: spec.name.to_string(),
                expected: spec.value_type.as_str(),
                actual: json_type_name(raw),
            };
            let value = match spec.value_type {
                ValueType::String => NodeValue::String(raw.as_str().ok_or_else(mismatch)?.to_string()),
                ValueType::Int => NodeValue::Int(raw.as_i64().ok_or_else(mismatch)?),
                ValueType::Float => NodeValue::Float(raw.as_f64().ok_or_else(mismatch)?),
                ValueType::Boolean => NodeValue::Boolean(raw.as_bool().ok_or_else(mismatch)?),
                ValueType::Image => {
                    let tensor: ImageTensor = serde_json::from_value(raw.clone()).map_err(|_| mismatch())?;
                    NodeValue::Image(tensor)
                }
            };
            inputs.insert(spec.name, value);
        }
        Ok(inputs)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
