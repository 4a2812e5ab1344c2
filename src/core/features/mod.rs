//! # Features Module
//!
//! Turns images into fixed-shape descriptors.
//!
//! ## Analyzers
//! - **Embedding** - 512-d ResNet vector (see [`ResnetEmbedder`])
//! - **HOG** - standardized 9-bin gradient histograms over 8x8 cells
//! - **Harris** - per-pixel corner response map
//! - **Keypoints** - difference-of-Gaussians interest points
//!
//! ## Example
//! ```rust,ignore
//! use defect_inspector::core::features::{FeatureExtractor, HogConfig, HogExtractor};
//!
//! let extractor = HogExtractor::new(HogConfig::new().cell_size(8));
//! let signature = extractor.extract_file(&path)?;
//! ```

pub mod embedding;
pub mod gradient;
pub mod harris;
pub mod hog;
pub mod keypoints;
mod traits;

pub use embedding::{EmbeddingConfig, ResnetDepth, ResnetEmbedder, EMBEDDING_DIM};
pub use harris::{compute_harris_response, HarrisConfig, HarrisExtractor};
pub use hog::{compute_hog_descriptor, crop_to_cells, HogConfig, HogExtractor};
pub use keypoints::{detect_keypoints, Keypoint, KeypointConfig, KeypointExtractor, KeypointSet};
pub use traits::{AnalyzerKind, FeatureExtractor};
