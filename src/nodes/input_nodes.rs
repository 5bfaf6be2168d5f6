//! Input nodes
//!
//! Primitive pass-through widgets and the base64 image decoder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::DynamicImage;
use tracing::warn;

use crate::bitmap::ImageTensor;
use crate::error::NodeError;
use crate::nodes::image_nodes::BLANK_IMAGE_SIZE;
use crate::nodes::schema::{InputSpec, NodeInputs, NodeSchema, NodeValue, OutputSpec, ValueType};
use crate::nodes::Node;
use crate::state::PluginContext;

const CATEGORY: &str = "IAT/Input";

/// Decode a base64 (optionally data-URL) string into an RGB image
pub fn decode_base64_image(input: &str) -> Result<ImageTensor, String> {
    let payload = match input.find("base64,") {
        Some(idx) => &input[idx + "base64,".len()..],
        None => input,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| e.to_string())?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    Ok(ImageTensor::from_dynamic(&DynamicImage::ImageRgb8(decoded.to_rgb8())))
}

pub struct Base64ToImage;

impl Node for Base64ToImage {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "Base64ToImageNode by IAT",
            display_name: "Base64 to Image by IAT",
            category: CATEGORY,
            function: "convert_base64",
            description: None,
            inputs: vec![InputSpec::string("base64_str", "").multiline()],
            outputs: vec![OutputSpec::new("IMAGE", ValueType::Image)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let image = match decode_base64_image(inputs.string("base64_str")?) {
            Ok(image) => image,
            Err(e) => {
                warn!(target: "iat::nodes", "Base64 conversion failed: {}", e);
                ImageTensor::blank(BLANK_IMAGE_SIZE, BLANK_IMAGE_SIZE)
            }
        };
        Ok(vec![NodeValue::Image(image)])
    }
}

pub struct FloatInput;

impl Node for FloatInput {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "FloatInputNode by IAT",
            display_name: "Float Input by IAT",
            category: CATEGORY,
            function: "get_float",
            description: None,
            inputs: vec![InputSpec::float("value", 0.0, 0.0, 100.0).step(0.01)],
            outputs: vec![OutputSpec::new("FLOAT", ValueType::Float)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        Ok(vec![NodeValue::Float(inputs.float("value")?)])
    }
}

pub struct IntInput;

impl Node for IntInput {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "IntInputNode by IAT",
            display_name: "Integer Input by IAT",
            category: CATEGORY,
            function: "get_int",
            description: None,
            inputs: vec![InputSpec::int("value", 0, 0, 100_000).step(1.0)],
            outputs: vec![OutputSpec::new("INT", ValueType::Int)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        Ok(vec![NodeValue::Int(inputs.int("value")?)])
    }
}

pub struct TextInput;

impl Node for TextInput {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "TextInputNode by IAT",
            display_name: "Text Input by IAT",
            category: CATEGORY,
            function: "get_text",
            description: None,
            inputs: vec![InputSpec::string("text", "请输入文本").multiline()],
            outputs: vec![OutputSpec::new("STRING", ValueType::String)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        Ok(vec![NodeValue::String(inputs.string("text")?.to_string())])
    }
}

/// Seed widget; the host advances the value after each run when
/// `control_after_generate` is set
pub struct SeedGenerator;

impl Node for SeedGenerator {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "SeedGeneratorNode by IAT",
            display_name: "Seed Generator by IAT",
            category: CATEGORY,
            function: "generate_seed",
            description: None,
            inputs: vec![
                InputSpec::int("seed", 0, 0, 9_999_999_999).step(1.0),
                InputSpec::boolean("control_after_generate", true),
            ],
            outputs: vec![OutputSpec::new("INT", ValueType::Int)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        Ok(vec![NodeValue::Int(inputs.int("seed")?)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unconfigured_context;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_base64(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 0, 0])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        let encoded = png_base64(4, 3);
        let plain = decode_base64_image(&encoded).unwrap();
        assert_eq!(plain.shape(), [1, 3, 4, 3]);
        assert_eq!(&plain.data()[..3], &[1.0, 0.0, 0.0]);

        let url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_base64_image(&url).unwrap(), plain);
    }

    #[test]
    fn test_base64_node_falls_back_to_blank() {
        let root = tempdir().unwrap();
        let ctx = unconfigured_context(root.path());
        let inputs = NodeInputs::new().with("base64_str", NodeValue::String("not an image".into()));

        let out = Base64ToImage.execute(&ctx, &inputs).unwrap();
        match &out[0] {
            NodeValue::Image(img) => {
                assert_eq!(img.shape(), [1, 512, 512, 3]);
                assert!(img.data().iter().all(|v| *v == 0.0));
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_primitive_nodes_pass_through() {
        let root = tempdir().unwrap();
        let ctx = unconfigured_context(root.path());

        let inputs = NodeInputs::new().with("value", NodeValue::Float(12.5));
        assert_eq!(FloatInput.execute(&ctx, &inputs).unwrap(), vec![NodeValue::Float(12.5)]);

        let inputs = NodeInputs::new().with("value", NodeValue::Int(42));
        assert_eq!(IntInput.execute(&ctx, &inputs).unwrap(), vec![NodeValue::Int(42)]);

        let inputs = NodeInputs::new().with("text", NodeValue::String("你好".into()));
        assert_eq!(
            TextInput.execute(&ctx, &inputs).unwrap(),
            vec![NodeValue::String("你好".into())]
        );

        let inputs = NodeInputs::new()
            .with("seed", NodeValue::Int(9_999_999_999))
            .with("control_after_generate", NodeValue::Boolean(false));
        assert_eq!(
            SeedGenerator.execute(&ctx, &inputs).unwrap(),
            vec![NodeValue::Int(9_999_999_999)]
        );
    }
}
