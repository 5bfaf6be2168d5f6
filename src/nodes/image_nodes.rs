//! Image geometry nodes
//!
//! Resize helpers operating on the first frame of an image batch.

use tracing::warn;

use crate::bitmap::{resize_lanczos, ImageTensor};
use crate::error::NodeError;
use crate::nodes::schema::{InputSpec, NodeInputs, NodeSchema, NodeValue, OutputSpec, ValueType};
use crate::nodes::Node;
use crate::state::PluginContext;

/// Largest side length the host allows for generated images
pub const MAX_RESOLUTION: i64 = 16384;

/// Pixel budget of an SDXL-sized image
pub const SDXL_TARGET_PIXELS: u64 = 1152 * 1152;

/// Size of the placeholder image returned for degenerate input
pub const BLANK_IMAGE_SIZE: usize = 512;

fn round_half_even(x: f64) -> i64 {
    x.round_ties_even() as i64
}

/// Target size when the longer side becomes `longest_side`
pub fn longest_side_size(width: u32, height: u32, longest_side: u32) -> (u32, u32) {
    let side = longest_side as f64;
    let (w, h) = (width as f64, height as f64);
    let (new_w, new_h) = if width > height {
        (longest_side as i64, round_half_even(h * (side / w)))
    } else {
        (round_half_even(w * (side / h)), longest_side as i64)
    };
    (new_w.max(1) as u32, new_h.max(1) as u32)
}

/// Sizes for the SDXL resize: `(multiple_of_4, original_ratio)`.
///
/// `None` when the source has no pixels.
pub fn sdxl_sizes(width: u32, height: u32) -> Option<((u32, u32), (u32, u32))> {
    let pixels = width as u64 * height as u64;
    if pixels == 0 {
        return None;
    }
    let target = SDXL_TARGET_PIXELS as f64;
    let scale = (target / pixels as f64).sqrt();
    let w_float = width as f64 * scale;
    let h_float = height as f64 * scale;

    let ratio = (
        round_half_even(w_float).max(1) as u32,
        round_half_even(h_float).max(1) as u32,
    );

    let mut w4 = ((round_half_even(w_float) / 4) * 4).max(4);
    let mut h4 = ((round_half_even(h_float) / 4) * 4).max(4);
    if (w4 * h4) as f64 > target {
        let shrink = (target / (w4 * h4) as f64).sqrt();
        w4 = (((w4 as f64 * shrink) / 4.0).floor() as i64 * 4).max(4);
        h4 = (((h4 as f64 * shrink) / 4.0).floor() as i64 * 4).max(4);
    }

    Some(((w4 as u32, h4 as u32), ratio))
}

fn resize_tensor(image: &ImageTensor, width: u32, height: u32) -> Result<ImageTensor, NodeError> {
    let frame = image.first_frame()?;
    Ok(ImageTensor::from_dynamic(&resize_lanczos(&frame, width, height)))
}

/// Resize one image to another's dimensions
pub struct ImageMatchSize;

impl Node for ImageMatchSize {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "ImageMatchSize by IAT",
            display_name: "Image Match Size by IAT",
            category: "IAT",
            function: "match_size",
            description: None,
            inputs: vec![InputSpec::image("reference_image"), InputSpec::image("input_image")],
            outputs: vec![OutputSpec::new("output_image", ValueType::Image)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let reference = inputs.image("reference_image")?;
        let input = inputs.image("input_image")?;
        let resized = resize_tensor(input, reference.width() as u32, reference.height() as u32)?;
        Ok(vec![NodeValue::Image(resized)])
    }
}

/// Scale so the longer side has a given length
pub struct ImageResizeLongestSide;

impl Node for ImageResizeLongestSide {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "ImageResizeLongestSide by IAT",
            display_name: "Image Resize Longest Side by IAT",
            category: "IAT",
            function: "resize_longest_side",
            description: None,
            inputs: vec![
                InputSpec::image("image"),
                InputSpec::int("longest_side", 1536, 64, MAX_RESOLUTION),
            ],
            outputs: vec![OutputSpec::new("resized_image", ValueType::Image)],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let image = inputs.image("image")?;
        let longest_side = inputs.int("longest_side")?.clamp(1, MAX_RESOLUTION) as u32;
        let (w, h) = longest_side_size(image.width() as u32, image.height() as u32, longest_side);
        Ok(vec![NodeValue::Image(resize_tensor(image, w, h)?)])
    }
}

/// Resize to roughly 1152² pixels, once snapped to multiples of 4 and
/// once keeping the exact aspect ratio
pub struct ImageResizeToSdxl;

impl Node for ImageResizeToSdxl {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "ImageResizeToSDXL by IAT",
            display_name: "ImageResizeToSDXL by IAT",
            category: "IAT",
            function: "resize_image",
            description: None,
            inputs: vec![InputSpec::image("image")],
            outputs: vec![
                OutputSpec::new("resized_16x", ValueType::Image),
                OutputSpec::new("resized_original_ratio", ValueType::Image),
            ],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let image = inputs.image("image")?;
        let Some(((w4, h4), (wr, hr))) = sdxl_sizes(image.width() as u32, image.height() as u32) else {
            warn!(target: "iat::nodes", "Input image has zero pixels.");
            let blank = ImageTensor::blank(BLANK_IMAGE_SIZE, BLANK_IMAGE_SIZE);
            return Ok(vec![NodeValue::Image(blank.clone()), NodeValue::Image(blank)]);
        };

        let frame = image.first_frame()?;
        let snapped = ImageTensor::from_dynamic(&resize_lanczos(&frame, w4, h4));
        let ratio = ImageTensor::from_dynamic(&resize_lanczos(&frame, wr, hr));
        Ok(vec![NodeValue::Image(snapped), NodeValue::Image(ratio)])
    }
}

/// Report width and height
pub struct ImageSize;

impl Node for ImageSize {
    fn schema(&self) -> NodeSchema {
        NodeSchema {
            class_name: "ImageSize by IAT",
            display_name: "Image Size by IAT",
            category: "IAT",
            function: "get_size",
            description: None,
            inputs: vec![InputSpec::image("image")],
            outputs: vec![
                OutputSpec::new("width", ValueType::Int),
                OutputSpec::new("height", ValueType::Int),
            ],
        }
    }

    fn execute(&self, _ctx: &PluginContext, inputs: &NodeInputs) -> Result<Vec<NodeValue>, NodeError> {
        let image = inputs.image("image")?;
        Ok(vec![
            NodeValue::Int(image.width() as i64),
            NodeValue::Int(image.height() as i64),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::unconfigured_context;
    use tempfile::tempdir;

    fn gray(width: usize, height: usize) -> ImageTensor {
        ImageTensor::new(1, height, width, 3, vec![0.5; width * height * 3]).unwrap()
    }

    fn image_of(value: &NodeValue) -> &ImageTensor {
        match value {
            NodeValue::Image(img) => img,
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_longest_side_landscape_and_portrait() {
        assert_eq!(longest_side_size(2000, 1000, 1536), (1536, 768));
        assert_eq!(longest_side_size(1000, 2000, 1536), (768, 1536));
        assert_eq!(longest_side_size(500, 500, 64), (64, 64));
        assert_eq!(longest_side_size(10000, 1, 64), (64, 1));
    }

    #[test]
    fn test_longest_side_rounds_half_to_even() {
        // 5 * 100 / 200 = 2.5 rounds to 2
        assert_eq!(longest_side_size(200, 5, 100), (100, 2));
    }

    #[test]
    fn test_sdxl_sizes_square() {
        assert_eq!(sdxl_sizes(1024, 1024), Some(((1152, 1152), (1152, 1152))));
    }

    #[test]
    fn test_sdxl_sizes_non_square() {
        let ((w4, h4), (wr, hr)) = sdxl_sizes(1920, 1080).unwrap();
        assert_eq!((wr, hr), (1536, 864));
        assert_eq!((w4 % 4, h4 % 4), (0, 0));
        assert!((w4 as u64) * (h4 as u64) <= SDXL_TARGET_PIXELS);
    }

    #[test]
    fn test_sdxl_sizes_shrinks_when_over_budget() {
        let ((w4, h4), _) = sdxl_sizes(3, 1).unwrap();
        assert_eq!((w4 % 4, h4 % 4), (0, 0));
        assert!((w4 as u64) * (h4 as u64) <= SDXL_TARGET_PIXELS);
        assert_eq!(sdxl_sizes(0, 100), None);
    }

    #[test]
    fn test_match_size_node() {
        let root = tempdir().unwrap();
        let ctx = unconfigured_context(root.path());
        let inputs = NodeInputs::new()
            .with("reference_image", NodeValue::Image(gray(30, 20)))
            .with("input_image", NodeValue::Image(gray(8, 8)));

        let out = ImageMatchSize.execute(&ctx, &inputs).unwrap();
        assert_eq!(image_of(&out[0]).shape(), [1, 20, 30, 3]);
    }

    #[test]
    fn test_sdxl_node_zero_pixels_gives_blanks() {
        let root = tempdir().unwrap();
        let ctx = unconfigured_context(root.path());
        let empty = ImageTensor::new(1, 0, 0, 3, vec![]).unwrap();
        let inputs = NodeInputs::new().with("image", NodeValue::Image(empty));

        let out = ImageResizeToSdxl.execute(&ctx, &inputs).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(image_of(&out[0]).shape(), [1, 512, 512, 3]);
        assert_eq!(image_of(&out[1]).shape(), [1, 512, 512, 3]);
    }

    #[test]
    fn test_size_node() {
        let root = tempdir().unwrap();
        let ctx = unconfigured_context(root.path());
        let inputs = NodeInputs::new().with("image", NodeValue::Image(gray(7, 5)));
        let out = ImageSize.execute(&ctx, &inputs).unwrap();
        assert_eq!(out, vec![NodeValue::Int(7), NodeValue::Int(5)]);
    }
}
