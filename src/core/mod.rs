//! # Core Module
//!
//! The presentation-agnostic inspection engine.
//!
//! ## Modules
//! - `loader` - Decodes images and converts them to sample arrays
//! - `features` - Extracts descriptors (embedding, HOG, Harris, keypoints)
//! - `comparator` - Judges a candidate descriptor against the reference
//! - `pipeline` - Orchestrates a batch and reports defects in input order
//! - `scanner` - Expands directories into image paths

pub mod comparator;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use comparator::{DefectRule, Judgement, Tolerance};
pub use features::{AnalyzerKind, FeatureExtractor};
pub use pipeline::{Batch, InspectionResult, Verdict};
