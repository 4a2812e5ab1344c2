//! Histogram of oriented gradients.
//!
//! The descriptor is built by:
//! 1. Sobel gradients, magnitude `sqrt(gx² + gy²)` and unsigned orientation
//!    `atan2(gy, gx) mod 180°`
//! 2. Splitting the image into non-overlapping square cells
//! 3. One magnitude-weighted orientation histogram per cell
//! 4. Standardizing all histograms jointly, then flattening them in
//!    row-major cell order

use super::gradient::sobel_gradients;
use super::traits::{AnalyzerKind, FeatureExtractor};
use crate::core::loader::to_gray_array;
use crate::error::{InvalidInputError, Result};
use image::DynamicImage;
use ndarray::{s, Array1, Array2, Zip};

/// Default cell edge length in pixels
pub const DEFAULT_CELL_SIZE: usize = 8;

/// Default number of orientation bins over 0-180°
pub const DEFAULT_BINS: usize = 9;

/// Number of leading descriptor entries kept for comparison
pub const DEFAULT_SIGNATURE_LEN: usize = 10;

/// Added to the standard deviation before dividing
pub const STANDARDIZE_EPSILON: f64 = 1e-5;

/// Configuration for the gradient-histogram analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct HogConfig {
    cell_size: usize,
    bins: usize,
    signature_len: usize,
}

impl HogConfig {
    /// Create a configuration with 8x8 cells, 9 bins and a 10-entry signature
    pub fn new() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            bins: DEFAULT_BINS,
            signature_len: DEFAULT_SIGNATURE_LEN,
        }
    }

    /// Set the cell edge length
    pub fn cell_size(mut self, cell_size: usize) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the number of orientation bins
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Set how many leading entries the batch signature keeps
    pub fn signature_len(mut self, signature_len: usize) -> Self {
        self.signature_len = signature_len;
        self
    }

    fn validate(&self) -> std::result::Result<(), InvalidInputError> {
        if self.cell_size == 0 {
            return Err(InvalidInputError::ZeroParameter { name: "cell_size" });
        }
        if self.bins == 0 {
            return Err(InvalidInputError::ZeroParameter { name: "bins" });
        }
        Ok(())
    }
}

impl Default for HogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the full descriptor of a grayscale image.
///
/// Height and width must both be multiples of the cell size; the image is
/// never cropped here. The result holds `bins` entries per cell.
pub fn compute_hog_descriptor(
    gray: &Array2<f64>,
    config: &HogConfig,
) -> std::result::Result<Array1<f64>, InvalidInputError> {
    config.validate()?;

    let cell = config.cell_size;
    let (height, width) = gray.dim();
    if height == 0 || width == 0 {
        return Err(InvalidInputError::TooSmall { height, width, cell });
    }
    if height % cell != 0 || width % cell != 0 {
        return Err(InvalidInputError::NotCellAligned { height, width, cell });
    }

    let (gx, gy) = sobel_gradients(gray);
    let magnitude = Zip::from(&gx).and(&gy).map_collect(|&x, &y| x.hypot(y));
    let orientation = Zip::from(&gx)
        .and(&gy)
        .map_collect(|&x, &y| y.atan2(x).to_degrees().rem_euclid(180.0));

    let histograms = cell_histograms(&magnitude, &orientation, cell, config.bins);
    Ok(standardize(&histograms))
}

/// One histogram row per cell, cells in row-major order.
fn cell_histograms(
    magnitude: &Array2<f64>,
    orientation: &Array2<f64>,
    cell: usize,
    bins: usize,
) -> Array2<f64> {
    let (height, width) = magnitude.dim();
    let bin_width = 180.0 / bins as f64;
    let mut histograms = Array2::zeros(((height / cell) * (width / cell), bins));

    let cells = magnitude
        .exact_chunks((cell, cell))
        .into_iter()
        .zip(orientation.exact_chunks((cell, cell)));

    for (mut histogram, (magnitudes, orientations)) in histograms.outer_iter_mut().zip(cells) {
        Zip::from(&magnitudes).and(&orientations).for_each(|&m, &o| {
            // An orientation of exactly 180° lands in the last bin
            let bin = ((o / bin_width) as usize).min(bins - 1);
            histogram[bin] += m;
        });
    }

    histograms
}

/// Subtract the global mean, divide by the global standard deviation, flatten.
fn standardize(histograms: &Array2<f64>) -> Array1<f64> {
    let mean = histograms.mean().unwrap_or(0.0);
    let std = histograms.std(0.0);
    histograms
        .iter()
        .map(|&v| (v - mean) / (std + STANDARDIZE_EPSILON))
        .collect()
}

/// Drop trailing rows and columns so both dimensions are cell multiples.
pub fn crop_to_cells(gray: &Array2<f64>, cell: usize) -> Array2<f64> {
    if cell == 0 {
        return gray.clone();
    }
    let (height, width) = gray.dim();
    gray.slice(s![..height - height % cell, ..width - width % cell])
        .to_owned()
}

/// Batch extractor: luma conversion, crop, descriptor, leading entries.
#[derive(Debug, Clone, Default)]
pub struct HogExtractor {
    config: HogConfig,
}

impl HogExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: HogConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &HogConfig {
        &self.config
    }
}

impl FeatureExtractor for HogExtractor {
    type Descriptor = Array1<f64>;

    fn extract(&self, image: &DynamicImage) -> Result<Array1<f64>> {
        self.config.validate()?;
        let gray = crop_to_cells(&to_gray_array(image), self.config.cell_size);
        let descriptor = compute_hog_descriptor(&gray, &self.config)?;
        let keep = self.config.signature_len.min(descriptor.len());
        Ok(descriptor.slice(s![..keep]).to_owned())
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Hog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectorError;
    use image::{GrayImage, Luma};

    fn vertical_edge(height: usize, width: usize) -> Array2<f64> {
        Array2::from_shape_fn((height, width), |(_, x)| if x < width / 2 { 0.0 } else { 255.0 })
    }

    #[test]
    fn descriptor_has_bins_per_cell() {
        let descriptor = compute_hog_descriptor(&vertical_edge(16, 24), &HogConfig::new()).unwrap();
        // 2 x 3 cells, 9 bins each
        assert_eq!(descriptor.len(), 54);
    }

    #[test]
    fn misaligned_image_is_rejected() {
        let result = compute_hog_descriptor(&vertical_edge(17, 24), &HogConfig::new());
        assert_eq!(
            result,
            Err(InvalidInputError::NotCellAligned {
                height: 17,
                width: 24,
                cell: 8
            })
        );
    }

    #[test]
    fn aligned_images_are_accepted() {
        for (h, w) in [(8, 8), (16, 8), (32, 40)] {
            assert!(compute_hog_descriptor(&vertical_edge(h, w), &HogConfig::new()).is_ok());
        }
    }

    #[test]
    fn descriptor_is_standardized() {
        let descriptor = compute_hog_descriptor(&vertical_edge(16, 16), &HogConfig::new()).unwrap();
        let mean = descriptor.mean().unwrap();
        let std = descriptor.std(0.0);

        assert!(mean.abs() < 1e-9);
        assert!((std - 1.0).abs() < 1e-3);
    }

    #[test]
    fn flat_image_gives_zero_descriptor() {
        let flat = Array2::from_elem((16, 16), 90.0);
        let descriptor = compute_hog_descriptor(&flat, &HogConfig::new()).unwrap();
        assert!(descriptor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn vertical_edge_energy_lands_in_first_bin() {
        // gx > 0, gy = 0 along the edge, orientation 0°
        let histograms = {
            let gray = vertical_edge(8, 16);
            let (gx, gy) = sobel_gradients(&gray);
            let magnitude = Zip::from(&gx).and(&gy).map_collect(|&x, &y| x.hypot(y));
            let orientation = Zip::from(&gx)
                .and(&gy)
                .map_collect(|&x, &y| y.atan2(x).to_degrees().rem_euclid(180.0));
            cell_histograms(&magnitude, &orientation, 8, 9)
        };

        assert!(histograms[[0, 0]] > 0.0);
        assert!(histograms.row(0).iter().skip(1).all(|&v| v == 0.0));
    }

    #[test]
    fn orientation_of_180_is_clamped_into_last_bin() {
        let magnitude = Array2::from_elem((8, 8), 1.0);
        let orientation = Array2::from_elem((8, 8), 180.0);
        let histograms = cell_histograms(&magnitude, &orientation, 8, 9);

        assert_eq!(histograms[[0, 8]], 64.0);
    }

    #[test]
    fn crop_truncates_trailing_samples() {
        let gray = Array2::from_shape_fn((19, 27), |(y, x)| (y * 100 + x) as f64);
        let cropped = crop_to_cells(&gray, 8);

        assert_eq!(cropped.dim(), (16, 24));
        assert_eq!(cropped[[15, 23]], gray[[15, 23]]);
    }

    #[test]
    fn extractor_keeps_leading_entries() {
        let image = GrayImage::from_fn(21, 18, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let signature = HogExtractor::default()
            .extract(&DynamicImage::ImageLuma8(image))
            .unwrap();
        assert_eq!(signature.len(), DEFAULT_SIGNATURE_LEN);
    }

    #[test]
    fn extractor_rejects_image_smaller_than_a_cell() {
        let image = GrayImage::from_pixel(5, 5, Luma([10]));
        let result = HogExtractor::default().extract(&DynamicImage::ImageLuma8(image));
        assert!(matches!(
            result,
            Err(InspectorError::InvalidInput(InvalidInputError::TooSmall { .. }))
        ));
    }
}
