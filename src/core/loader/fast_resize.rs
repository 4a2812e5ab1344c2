//! SIMD-accelerated RGB resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON kernels when available.

use crate::error::ResourceError;
use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::RgbImage;
use std::path::PathBuf;

/// Reusable resizer for RGB images
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize an RGB image to exactly `width` x `height` with a bilinear filter.
    pub fn resize_rgb(
        &mut self,
        image: &RgbImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, ResourceError> {
        let (src_width, src_height) = image.dimensions();

        if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
            return Err(ResourceError::Decode {
                path: PathBuf::new(),
                reason: format!(
                    "Invalid resize from {}x{} to {}x{}",
                    src_width, src_height, width, height
                ),
            });
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, image.as_raw().clone(), PixelType::U8x3)
                .map_err(|e| ResourceError::Decode {
                    path: PathBuf::new(),
                    reason: format!("Failed to create source image: {}", e),
                })?;

        let mut dst_image = Image::new(width, height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| ResourceError::Decode {
                path: PathBuf::new(),
                reason: format!("Resize failed: {}", e),
            })?;

        RgbImage::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
            ResourceError::Decode {
                path: PathBuf::new(),
                reason: "Failed to create result buffer".to_string(),
            }
        })
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off resizing
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage, ResourceError> {
    FastResizer::new().resize_rgb(image, width, height)
}
