//! Harris corner response.
//!
//! Every pixel gets `det(M) - k * trace(M)²`, where `M` is the structure
//! tensor `[[Ix², IxIy], [IxIy, Iy²]]` summed over a square window. The
//! full map is returned; there is no thresholding or non-maximum
//! suppression.

use super::gradient::{sobel_gradients, window_sum};
use super::traits::{AnalyzerKind, FeatureExtractor};
use crate::core::loader::to_gray_array;
use crate::error::{InvalidInputError, Result};
use image::DynamicImage;
use ndarray::{Array2, Zip};

/// Default structure-tensor window edge length
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Default Harris sensitivity `k`
pub const DEFAULT_SENSITIVITY: f64 = 0.04;

/// Harris response parameters
#[derive(Debug, Clone, PartialEq)]
pub struct HarrisConfig {
    window_size: usize,
    sensitivity: f64,
}

impl HarrisConfig {
    /// Create a configuration with a 3x3 window and k = 0.04
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }

    /// Set the window edge length
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the sensitivity `k`
    pub fn sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }
}

impl Default for HarrisConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the per-pixel corner response. The output has the input's shape.
pub fn compute_harris_response(
    gray: &Array2<f64>,
    config: &HarrisConfig,
) -> std::result::Result<Array2<f64>, InvalidInputError> {
    if config.window_size == 0 {
        return Err(InvalidInputError::ZeroParameter { name: "window_size" });
    }

    let (ix, iy) = sobel_gradients(gray);
    let ixx = window_sum(&(&ix * &ix), config.window_size);
    let ixy = window_sum(&(&ix * &iy), config.window_size);
    let iyy = window_sum(&(&iy * &iy), config.window_size);

    let k = config.sensitivity;
    Ok(Zip::from(&ixx)
        .and(&ixy)
        .and(&iyy)
        .map_collect(|&xx, &xy, &yy| {
            let det = xx * yy - xy * xy;
            let trace = xx + yy;
            det - k * trace * trace
        }))
}

/// Batch extractor: grayscale conversion followed by the full response map
#[derive(Debug, Clone, Default)]
pub struct HarrisExtractor {
    config: HarrisConfig,
}

impl HarrisExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: HarrisConfig) -> Self {
        Self { config }
    }
}

impl FeatureExtractor for HarrisExtractor {
    type Descriptor = Array2<f64>;

    fn extract(&self, image: &DynamicImage) -> Result<Array2<f64>> {
        Ok(compute_harris_response(&to_gray_array(image), &self.config)?)
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Harris
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize, lo: usize, hi: usize) -> Array2<f64> {
        Array2::from_shape_fn((size, size), |(y, x)| {
            if (lo..hi).contains(&y) && (lo..hi).contains(&x) {
                255.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn response_keeps_input_shape() {
        let response = compute_harris_response(&square(20, 5, 12), &HarrisConfig::new()).unwrap();
        assert_eq!(response.dim(), (20, 20));
    }

    #[test]
    fn flat_image_has_zero_response() {
        let flat = Array2::from_elem((12, 9), 200.0);
        let response = compute_harris_response(&flat, &HarrisConfig::new()).unwrap();
        assert!(response.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn corner_outscores_edge_and_interior() {
        let response = compute_harris_response(&square(24, 8, 16), &HarrisConfig::new()).unwrap();

        let corner = response[[8, 8]];
        let edge = response[[8, 12]];
        let interior = response[[12, 12]];

        assert!(corner > 0.0);
        assert!(corner > edge);
        assert!(corner > interior);
        // Straight edges have one dominant eigenvalue, so a negative response
        assert!(edge < 0.0);
    }

    #[test]
    fn sensitivity_changes_response() {
        let image = square(24, 8, 16);
        let low = compute_harris_response(&image, &HarrisConfig::new().sensitivity(0.04)).unwrap();
        let high = compute_harris_response(&image, &HarrisConfig::new().sensitivity(0.2)).unwrap();
        assert!(high[[8, 8]] < low[[8, 8]]);
    }

    #[test]
    fn zero_window_is_rejected() {
        let result = compute_harris_response(&square(10, 2, 5), &HarrisConfig::new().window_size(0));
        assert_eq!(
            result,
            Err(InvalidInputError::ZeroParameter { name: "window_size" })
        );
    }
}
