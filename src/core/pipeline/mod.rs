//! # Pipeline Module
//!
//! Orchestrates a batch inspection.
//!
//! ## Stages
//! 1. **Split** - Separate the reference from the ordered candidates
//! 2. **Extract** - Compute the reference descriptor once
//! 3. **Judge** - Extract and judge each candidate in input order
//! 4. **Report** - Return verdicts; defect basenames keep input order
//!
//! Processing is sequential. Any failure ends the batch with no partial
//! result.

mod batch;
mod executor;

pub use batch::{basename, Batch};
pub use executor::{
    inspect_against_reference, inspect_each, interpret_harris_response,
    interpret_hog_descriptors, interpret_resnet_features, interpret_sift_features,
    report_resnet_similarity, InspectionResult, Verdict,
};
