//! Qwen text nodes
//!
//! Thin node wrappers over [`Translator`] and [`PromptOptimizer`]. Failures
//! never surface as node errors: the host gets a single string either way.

use crate::error::NodeError;
use crate::nodes::schema::{InputSpec, NodeInputs, NodeSchema, NodeValue, OutputSpec, ValueType};
use crate::nodes::Node;
use crate::state::PluginContext;
use crate::text::{PromptOptimizer, Translator};

pub struct QwenTranslator;

impl Node for QwenTranslator {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "QwenTranslator by IAT",
            display_name: "Qwen Translator by IAT",
            category: "IAT",
            function: "translate",
            description: None,
            inputs: vec![InputSpec::string("text", "请输入要翻译的文本").multiline()],
            outputs: vec![OutputSpec::new("translated_text", ValueType::String)],
        }
    }

    fn execute(&self, ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let text = inputs.string("text")?;
        let translated = Translator::new(ctx.models().clone())
            .translate(text)
            .unwrap_or_else(|e| e.host_message("翻译失败"));
        Ok(vec![NodeValue::String(translated)])
    }
}

/// Rewrites edit requests into Flux Kontext prompts
pub struct QwenKontextTranslator;

impl Node for QwenKontextTranslator {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "QwenKontextTranslator by IAT",
            display_name: "QwenKontextTranslator by IAT",
            category: "IAT",
            function: "optimize_prompt",
            description: None,
            inputs: vec![InputSpec::string("text", "请输入Kontext提示词").multiline()],
            outputs: vec![OutputSpec::new("optimized_prompt", ValueType::String)],
        }
    }

    fn execute(&self, ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let text = inputs.string("text")?;
        let optimized = PromptOptimizer::new(ctx.models().clone())
            .optimize_prompt(text)
            .unwrap_or_else(|e| e.host_message("优化失败"));
        Ok(vec![NodeValue::String(optimized)])
    }
}
