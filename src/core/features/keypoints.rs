//! Scale-invariant keypoint detection.
//!
//! A difference-of-Gaussians scale space is built octave by octave. A
//! sample becomes a keypoint when it:
//! - is an extremum among its 26 neighbours across space and scale
//! - clears the contrast threshold
//! - is not an edge (principal curvature ratio below the edge threshold)
//!
//! Only the detections are produced; no orientation or descriptor is
//! computed because nothing downstream compares them.

use super::traits::{AnalyzerKind, FeatureExtractor};
use crate::core::loader::to_gray_array;
use crate::error::{InvalidInputError, Result};
use image::{DynamicImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Scale-space parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointConfig {
    sigma: f64,
    intervals: usize,
    assumed_blur: f64,
    contrast_threshold: f64,
    edge_threshold: f64,
    border: usize,
}

impl KeypointConfig {
    /// Create a configuration with the classic SIFT defaults
    pub fn new() -> Self {
        Self {
            sigma: 1.6,
            intervals: 3,
            assumed_blur: 0.5,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            border: 5,
        }
    }

    /// Set the base blur of each octave
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the number of sampled intervals per octave
    pub fn intervals(mut self, intervals: usize) -> Self {
        self.intervals = intervals;
        self
    }

    /// Set the contrast threshold (on samples scaled to `[0, 1]`)
    pub fn contrast_threshold(mut self, threshold: f64) -> Self {
        self.contrast_threshold = threshold;
        self
    }

    /// Set the maximum principal curvature ratio
    pub fn edge_threshold(mut self, threshold: f64) -> Self {
        self.edge_threshold = threshold;
        self
    }

    /// Set the number of border pixels skipped per octave
    pub fn border(mut self, border: usize) -> Self {
        self.border = border;
        self
    }
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A detected interest point, in input-image coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub octave: usize,
    pub layer: usize,
    /// Blur of the layer the point was found on
    pub sigma: f64,
    /// Absolute difference-of-Gaussians value
    pub response: f64,
}

/// Unordered set of detected keypoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    keypoints: Vec<Keypoint>,
}

impl KeypointSet {
    /// Number of detections
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// True when nothing was detected
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Iterate over the detections
    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.iter()
    }
}

impl From<Vec<Keypoint>> for KeypointSet {
    fn from(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }
}

/// Detect keypoints on a grayscale image with samples in `[0, 255]`.
pub fn detect_keypoints(
    gray: &Array2<f64>,
    config: &KeypointConfig,
) -> std::result::Result<KeypointSet, InvalidInputError> {
    if config.intervals == 0 {
        return Err(InvalidInputError::ZeroParameter { name: "intervals" });
    }

    let (height, width) = gray.dim();
    let min_side = height.min(width);
    let min_octave_side = 2 * config.border + 3;
    if min_side < min_octave_side {
        return Ok(KeypointSet::default());
    }

    let octaves = ((min_side as f64).log2().floor() as usize).saturating_sub(2).max(1);
    let layer_sigmas = layer_increments(config);
    let base_blur = (config.sigma.powi(2) - config.assumed_blur.powi(2)).max(0.01).sqrt();
    let threshold = 0.5 * config.contrast_threshold / config.intervals as f64;

    let mut base = gaussian_blur(&gray.mapv(|v| v / 255.0), base_blur);
    let mut keypoints = Vec::new();

    for octave in 0..octaves {
        let (h, w) = base.dim();
        if h.min(w) < min_octave_side {
            break;
        }

        let mut gaussians = Vec::with_capacity(layer_sigmas.len() + 1);
        gaussians.push(base);
        for &increment in &layer_sigmas {
            let next = gaussian_blur(&gaussians[gaussians.len() - 1], increment);
            gaussians.push(next);
        }

        let dogs: Vec<Array2<f64>> = gaussians.windows(2).map(|pair| &pair[1] - &pair[0]).collect();

        for layer in 1..=config.intervals {
            let scale = 2f64.powi(octave as i32);
            let layer_sigma = config.sigma * 2f64.powf(layer as f64 / config.intervals as f64) * scale;

            for (y, x, value) in layer_extrema(&dogs[layer - 1], &dogs[layer], &dogs[layer + 1], threshold, config) {
                keypoints.push(Keypoint {
                    x: x as f64 * scale,
                    y: y as f64 * scale,
                    octave,
                    layer,
                    sigma: layer_sigma,
                    response: value.abs(),
                });
            }
        }

        base = gaussians[config.intervals].slice(s![..;2, ..;2]).to_owned();
    }

    Ok(KeypointSet { keypoints })
}

/// Incremental blurs taking layer `i - 1` to layer `i` within an octave.
fn layer_increments(config: &KeypointConfig) -> Vec<f64> {
    let k = 2f64.powf(1.0 / config.intervals as f64);
    (1..config.intervals + 3)
        .map(|i| {
            let previous = config.sigma * k.powi(i as i32 - 1);
            let total = previous * k;
            (total * total - previous * previous).sqrt()
        })
        .collect()
}

/// Extrema of `current` that pass the contrast and edge tests.
fn layer_extrema(
    below: &Array2<f64>,
    current: &Array2<f64>,
    above: &Array2<f64>,
    threshold: f64,
    config: &KeypointConfig,
) -> Vec<(usize, usize, f64)> {
    let (height, width) = current.dim();
    let border = config.border.max(1);
    let mut found = Vec::new();

    for y in border..height.saturating_sub(border) {
        for x in border..width.saturating_sub(border) {
            let value = current[[y, x]];
            if value.abs() <= threshold {
                continue;
            }

            let neighbourhood = [below, current, above]
                .map(|layer| layer.slice(s![y - 1..=y + 1, x - 1..=x + 1]));
            let is_extremum = if value > 0.0 {
                neighbourhood.iter().all(|n| n.iter().all(|&v| value >= v))
            } else {
                neighbourhood.iter().all(|n| n.iter().all(|&v| value <= v))
            };

            if is_extremum && !is_edge(current, y, x, config.edge_threshold) {
                found.push((y, x, value));
            }
        }
    }

    found
}

/// Reject points whose Hessian has one dominant curvature.
fn is_edge(layer: &Array2<f64>, y: usize, x: usize, edge_threshold: f64) -> bool {
    let center = layer[[y, x]];
    let dxx = layer[[y, x + 1]] + layer[[y, x - 1]] - 2.0 * center;
    let dyy = layer[[y + 1, x]] + layer[[y - 1, x]] - 2.0 * center;
    let dxy = (layer[[y + 1, x + 1]] - layer[[y + 1, x - 1]] - layer[[y - 1, x + 1]]
        + layer[[y - 1, x - 1]])
        / 4.0;

    let trace = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    det <= 0.0 || trace * trace * edge_threshold >= (edge_threshold + 1.0).powi(2) * det
}

/// Gaussian blur through imageproc on a single-channel float image.
///
/// A non-positive sigma leaves the samples untouched.
fn gaussian_blur(samples: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma <= 0.0 {
        return samples.clone();
    }

    let (height, width) = samples.dim();
    let image: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            Luma([samples[[y as usize, x as usize]] as f32])
        });
    let blurred = gaussian_blur_f32(&image, sigma as f32);

    Array2::from_shape_fn((height, width), |(y, x)| {
        f64::from(blurred.get_pixel(x as u32, y as u32)[0])
    })
}

/// Batch extractor: grayscale conversion followed by detection
#[derive(Debug, Clone, Default)]
pub struct KeypointExtractor {
    config: KeypointConfig,
}

impl KeypointExtractor {
    /// Create an extractor with the given configuration
    pub fn new(config: KeypointConfig) -> Self {
        Self { config }
    }
}

impl FeatureExtractor for KeypointExtractor {
    type Descriptor = KeypointSet;

    fn extract(&self, image: &DynamicImage) -> Result<KeypointSet> {
        Ok(detect_keypoints(&to_gray_array(image), &self.config)?)
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Keypoints
    }
}
