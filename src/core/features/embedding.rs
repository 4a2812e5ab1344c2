//! Deep embedding from a frozen ResNet.
//!
//! Images are resized so the shorter side is 256, center-cropped to
//! 224x224, scaled to `[0, 1]` and normalized with the ImageNet channel
//! statistics. The network runs without its classification head, so the
//! output is the 512-channel global-average-pool vector.
//!
//! The embedder is built once (weights loaded, graph constructed) and is
//! read-only afterwards.

use super::traits::{AnalyzerKind, FeatureExtractor};
use crate::core::loader::FastResizer;
use crate::error::{InspectorError, ModelError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Func, Module, VarBuilder};
use candle_transformers::models::resnet;
use image::{DynamicImage, RgbImage};
use ndarray::Array1;
use std::path::Path;

/// Length of the embedding vector
pub const EMBEDDING_DIM: usize = 512;

/// Per-channel ImageNet mean
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel ImageNet standard deviation
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// ResNet depths whose pooled output has 512 channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResnetDepth {
    Resnet18,
    Resnet34,
}

/// Preprocessing and architecture settings
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    resize_shorter: u32,
    crop_size: u32,
    depth: ResnetDepth,
}

impl EmbeddingConfig {
    /// ResNet-18, resize to 256, crop to 224
    pub fn new() -> Self {
        Self {
            resize_shorter: 256,
            crop_size: 224,
            depth: ResnetDepth::Resnet18,
        }
    }

    /// Set the target length of the shorter side before cropping
    pub fn resize_shorter(mut self, size: u32) -> Self {
        self.resize_shorter = size;
        self
    }

    /// Set the square crop edge length
    pub fn crop_size(mut self, size: u32) -> Self {
        self.crop_size = size;
        self
    }

    /// Set the network depth
    pub fn depth(mut self, depth: ResnetDepth) -> Self {
        self.depth = depth;
        self
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resize the shorter side to `resize_shorter` and center-crop a square.
pub fn resize_and_crop(image: &DynamicImage, config: &EmbeddingConfig) -> Result<RgbImage> {
    if config.crop_size == 0 || config.crop_size > config.resize_shorter {
        return Err(InspectorError::Config(format!(
            "crop size {} must be between 1 and the resize target {}",
            config.crop_size, config.resize_shorter
        )));
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let target = config.resize_shorter as u64;
    let (new_width, new_height) = if width <= height {
        (target, height as u64 * target / width.max(1) as u64)
    } else {
        (width as u64 * target / height.max(1) as u64, target)
    };

    let resized = FastResizer::new().resize_rgb(&rgb, new_width as u32, new_height as u32)?;

    let crop = config.crop_size;
    let left = ((new_width as u32 - crop) as f64 / 2.0).round() as u32;
    let top = ((new_height as u32 - crop) as f64 / 2.0).round() as u32;
    Ok(image::imageops::crop_imm(&resized, left, top, crop, crop).to_image())
}

/// Channel-first `(3, H, W)` tensor scaled to `[0, 1]` and normalized.
pub fn to_normalized_tensor(image: &RgbImage, device: &Device) -> std::result::Result<Tensor, ModelError> {
    let (width, height) = image.dimensions();
    let samples: Vec<f32> = image.as_raw().iter().map(|&v| v as f32 / 255.0).collect();

    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;

    Ok(Tensor::from_vec(samples, (height as usize, width as usize, 3), device)?
        .permute((2, 0, 1))?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)?)
}

/// Frozen ResNet feature network
pub struct ResnetEmbedder {
    model: Func<'static>,
    device: Device,
    config: EmbeddingConfig,
}

impl ResnetEmbedder {
    /// Load safetensors weights (timm naming) onto `device`.
    pub fn load(
        weights: &Path,
        config: EmbeddingConfig,
        device: Device,
    ) -> std::result::Result<Self, ModelError> {
        if !weights.is_file() {
            return Err(ModelError::WeightsNotFound {
                path: weights.to_path_buf(),
            });
        }

        // SAFETY: the weights file is memory-mapped read-only and not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device) }
            .map_err(|e| ModelError::Load {
                path: weights.to_path_buf(),
                reason: e.to_string(),
            })?;

        let embedder = Self::from_var_builder(vb, config, device.clone()).map_err(|e| {
            ModelError::Load {
                path: weights.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            weights = %weights.display(),
            depth = ?embedder.config.depth,
            "ResNet embedder loaded"
        );

        Ok(embedder)
    }

    /// Build the network from an existing variable store
    pub fn from_var_builder(
        vb: VarBuilder<'static>,
        config: EmbeddingConfig,
        device: Device,
    ) -> std::result::Result<Self, ModelError> {
        let model = match config.depth {
            ResnetDepth::Resnet18 => resnet::resnet18_no_final_layer(vb)?,
            ResnetDepth::Resnet34 => resnet::resnet34_no_final_layer(vb)?,
        };

        Ok(Self {
            model,
            device,
            config,
        })
    }

    /// Run the network on a `(N, 3, H, W)` batch, returning `(N, 512)`
    pub fn forward(&self, batch: &Tensor) -> std::result::Result<Tensor, ModelError> {
        Ok(self.model.forward(batch)?)
    }

    /// Device the network runs on
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl FeatureExtractor for ResnetEmbedder {
    type Descriptor = Array1<f32>;

    fn extract(&self, image: &DynamicImage) -> Result<Array1<f32>> {
        let cropped = resize_and_crop(image, &self.config)?;
        let input = to_normalized_tensor(&cropped, &self.device)?
            .unsqueeze(0)
            .map_err(ModelError::from)?;

        let features = self
            .forward(&input)?
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(ModelError::from)?;

        Ok(Array1::from_vec(features))
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Embedding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn crop_is_square_for_landscape_and_portrait() {
        let config = EmbeddingConfig::new();
        for (w, h) in [(640, 480), (300, 500), (256, 256)] {
            let cropped = resize_and_crop(&gradient_image(w, h), &config).unwrap();
            assert_eq!(cropped.dimensions(), (224, 224));
        }
    }

    #[test]
    fn crop_larger_than_resize_is_rejected() {
        let config = EmbeddingConfig::new().resize_shorter(200);
        let result = resize_and_crop(&gradient_image(300, 300), &config);
        assert!(matches!(result, Err(InspectorError::Config(_))));
    }

    #[test]
    fn tensor_is_channel_first_and_normalized() {
        let image = RgbImage::from_pixel(4, 3, Rgb([255, 0, 128]));
        let tensor = to_normalized_tensor(&image, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[3, 3, 4]);

        let red: Vec<f32> = tensor.get(0).unwrap().flatten_all().unwrap().to_vec1().unwrap();
        let expected = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!(red.iter().all(|v| (v - expected).abs() < 1e-5));
    }

    #[test]
    fn missing_weights_are_reported() {
        let result = ResnetEmbedder::load(
            Path::new("/nonexistent/resnet18.safetensors"),
            EmbeddingConfig::new(),
            Device::Cpu,
        );
        assert!(matches!(result, Err(ModelError::WeightsNotFound { .. })));
    }

    #[test]
    fn headless_network_outputs_512_channels() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let embedder = ResnetEmbedder::from_var_builder(vb, EmbeddingConfig::new(), Device::Cpu).unwrap();

        let batch = Tensor::zeros((1, 3, 64, 64), DType::F32, &Device::Cpu).unwrap();
        let output = embedder.forward(&batch).unwrap();
        assert_eq!(output.dims(), &[1, EMBEDDING_DIM]);
    }
}
