//! Trait definitions for descriptor extraction.

use crate::core::loader::load_image;
use crate::error::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Available analyzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyzerKind {
    /// Pretrained ResNet feature vector compared by cosine similarity
    Embedding,
    /// Histogram of oriented gradients, first bins compared for near-equality
    Hog,
    /// Full Harris corner-response map compared for near-equality
    Harris,
    /// Scale-space keypoints; any detection flags the image
    Keypoints,
}

impl AnalyzerKind {
    /// Get a human-readable description of the analyzer
    pub fn description(&self) -> &'static str {
        match self {
            AnalyzerKind::Embedding => {
                "ResNet embedding - flags candidates whose cosine similarity falls below a threshold"
            }
            AnalyzerKind::Hog => {
                "Gradient histogram - flags candidates whose leading bins differ from the reference"
            }
            AnalyzerKind::Harris => {
                "Harris response - flags candidates whose corner map differs from the reference"
            }
            AnalyzerKind::Keypoints => {
                "Scale-space keypoints - flags every image with at least one keypoint"
            }
        }
    }
}

impl std::fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerKind::Embedding => write!(f, "ResNet"),
            AnalyzerKind::Hog => write!(f, "HOG"),
            AnalyzerKind::Harris => write!(f, "Harris"),
            AnalyzerKind::Keypoints => write!(f, "SIFT"),
        }
    }
}

/// Maps one image to one descriptor
pub trait FeatureExtractor {
    /// Descriptor produced for a single image
    type Descriptor;

    /// Extract the descriptor from an already-decoded image
    fn extract(&self, image: &DynamicImage) -> Result<Self::Descriptor>;

    /// Decode `path` and extract its descriptor. The decoded image is
    /// dropped before returning.
    fn extract_file(&self, path: &Path) -> Result<Self::Descriptor> {
        let image = load_image(path)?;
        self.extract(&image)
    }

    /// Get the analyzer kind
    fn kind(&self) -> AnalyzerKind;
}
