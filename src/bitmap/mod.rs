//! Host image type
//!
//! Images travel between nodes as a batch of float frames laid out
//! batch × height × width × channels with values in 0..1. Resampling
//! goes through 8-bit `image` buffers.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Float image batch as exchanged with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawImageTensor")]
pub struct ImageTensor {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

/// Wire layout, checked by [`ImageTensor::new`] before use
#[derive(Deserialize)]
struct RawImageTensor {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f32>,
}

impl TryFrom<RawImageTensor> for ImageTensor {
    type Error = NodeError;

    fn try_from(raw: RawImageTensor) -> Result<Self, Self::Error> {
        Self::new(raw.batch, raw.height, raw.width, raw.channels, raw.data)
    }
}

/// Product of the dimensions, `None` on overflow
fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
}

impl ImageTensor {
    pub fn new(batch: usize, height: usize, width: usize, channels: usize, data: Vec<f32>) -> Result<Self, NodeError> {
        let expected = element_count(&[batch, height, width, channels]).ok_or_else(|| {
            NodeError::Image(format!(
                "tensor shape {}x{}x{}x{} overflows",
                batch, height, width, channels
            ))
        })?;
        if data.len() != expected {
            return Err(NodeError::Image(format!(
                "tensor data has {} values, shape {}x{}x{}x{} needs {}",
                data.len(),
                batch,
                height,
                width,
                channels,
                expected
            )));
        }
        Ok(Self {
            batch,
            height,
            width,
            channels,
            data,
        })
    }

    /// Black RGB image, batch of one
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            batch: 1,
            height,
            width,
            channels: 3,
            data: vec![0.0; width * height * 3],
        }
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        [self.batch, self.height, self.width, self.channels]
    }

    /// First frame as an 8-bit image. Values are scaled by 255, clipped,
    /// and truncated.
    pub fn first_frame(&self) -> Result<DynamicImage, NodeError> {
        if self.batch == 0 {
            return Err(NodeError::Image("image batch is empty".into()));
        }
        let frame_len = element_count(&[self.height, self.width, self.channels])
            .ok_or_else(|| NodeError::Image("frame size overflows".into()))?;
        if self.data.len() < frame_len {
            return Err(NodeError::Image("tensor data shorter than its shape".into()));
        }
        let bytes: Vec<u8> = self.data[..frame_len]
            .iter()
            .map(|v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();

        let (w, h) = (self.width as u32, self.height as u32);
        let image = match self.channels {
            1 => GrayImage::from_raw(w, h, bytes).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgba8),
            n => return Err(NodeError::Image(format!("unsupported channel count {}", n))),
        };
        image.ok_or_else(|| NodeError::Image("frame buffer size mismatch".into()))
    }

    /// Batch of one from an 8-bit image, keeping gray/alpha layouts
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let (channels, bytes) = if image.color().has_alpha() {
            (4, image.to_rgba8().into_raw())
        } else if matches!(image, DynamicImage::ImageLuma8(_)) {
            (1, image.to_luma8().into_raw())
        } else {
            (3, image.to_rgb8().into_raw())
        };

        Self {
            batch: 1,
            height,
            width,
            channels,
            data: bytes.into_iter().map(|b| b as f32 / 255.0).collect(),
        }
    }
}

/// Lanczos resample to exactly `width` × `height`
pub fn resize_lanczos(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.resize_exact(width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(ImageTensor::new(1, 2, 2, 3, vec![0.0; 12]).is_ok());
        assert!(ImageTensor::new(1, 2, 2, 3, vec![0.0; 11]).is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        let err = ImageTensor::new(1, usize::MAX / 2, 4, 3, vec![]).unwrap_err();
        assert!(matches!(err, NodeError::Image(_)));
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let oversized = format!(
            r#"{{"batch":1,"height":{},"width":4,"channels":3,"data":[]}}"#,
            usize::MAX / 2
        );
        assert!(serde_json::from_str::<ImageTensor>(&oversized).is_err());

        let short = r#"{"batch":1,"height":2,"width":2,"channels":3,"data":[0.0,0.0]}"#;
        assert!(serde_json::from_str::<ImageTensor>(short).is_err());

        let ok = r#"{"batch":1,"height":1,"width":1,"channels":3,"data":[0.0,0.5,1.0]}"#;
        let tensor: ImageTensor = serde_json::from_str(ok).unwrap();
        assert_eq!(tensor.shape(), [1, 1, 1, 3]);
    }

    #[test]
    fn test_first_frame_clips_and_scales() {
        let tensor = ImageTensor::new(1, 1, 2, 3, vec![0.0, 0.5, 1.0, 2.0, -1.0, 0.999]).unwrap();
        let rgb = tensor.first_frame().unwrap().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 127, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 0, 254]);
    }

    #[test]
    fn test_first_frame_ignores_rest_of_batch() {
        let mut data = vec![1.0; 3];
        data.extend(vec![0.0; 3]);
        let tensor = ImageTensor::new(2, 1, 1, 3, data).unwrap();
        assert_eq!(tensor.first_frame().unwrap().to_rgb8().get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_round_trip_keeps_layout() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255])));
        let tensor = ImageTensor::from_dynamic(&rgba);
        assert_eq!(tensor.shape(), [1, 2, 3, 4]);
        assert_eq!(&tensor.data()[..4], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_resize_lanczos_exact_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 20));
        let out = resize_lanczos(&img, 7, 3);
        assert_eq!((out.width(), out.height()), (7, 3));
    }
}
