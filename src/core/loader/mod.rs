//! # Loader Module
//!
//! Decodes images from disk and converts them into the sample arrays the
//! analyzers work on.
//!
//! Every analyzer sees the same grayscale conversion: color images are
//! weighted `0.2989 R + 0.5870 G + 0.1140 B` without rounding, grayscale
//! images pass through unchanged.

pub mod fast_decode;
pub mod fast_resize;

pub use fast_decode::{FastDecoder, ImageFormat};
pub use fast_resize::{resize_rgb, FastResizer};

use crate::error::ResourceError;
use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;

/// Luma weights for the R, G and B channels
pub const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage, ResourceError> {
    FastDecoder::decode(path)
}

/// Single-channel grayscale samples shaped `(height, width)`, using
/// [`LUMA_WEIGHTS`] for color input.
pub fn to_gray_array(image: &DynamicImage) -> Array2<f64> {
    if !image.color().has_color() {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        return Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            gray.get_pixel(x as u32, y as u32)[0] as f64
        });
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        let [r, g, b] = rgb.get_pixel(x as u32, y as u32).0;
        LUMA_WEIGHTS[0] * r as f64 + LUMA_WEIGHTS[1] * g as f64 + LUMA_WEIGHTS[2] * b as f64
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn gray_array_is_row_major() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(x + 10 * y) as u8]));
        let array = to_gray_array(&DynamicImage::ImageLuma8(image));

        assert_eq!(array.dim(), (2, 3));
        assert_eq!(array[[1, 2]], 12.0);
    }

    #[test]
    fn color_uses_luma_weights() {
        let image = RgbImage::from_pixel(2, 2, Rgb([100, 50, 200]));
        let array = to_gray_array(&DynamicImage::ImageRgb8(image));

        let expected = 0.2989 * 100.0 + 0.5870 * 50.0 + 0.1140 * 200.0;
        assert!(array.iter().all(|&v| (v - expected).abs() < 1e-9));
    }

    #[test]
    fn grayscale_samples_pass_through() {
        let image = GrayImage::from_pixel(4, 4, Luma([77]));
        let array = to_gray_array(&DynamicImage::ImageLuma8(image));
        assert!(array.iter().all(|&v| v == 77.0));
    }

    #[test]
    fn rgba_ignores_alpha_and_uses_luma_weights() {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 255, 10]));
        let array = to_gray_array(&DynamicImage::ImageRgba8(image));
        assert!((array[[0, 0]] - 0.1140 * 255.0).abs() < 1e-9);
    }
}
