//! # Comparator Module
//!
//! Turns a pair of descriptors into a defect verdict.
//!
//! ## Rules
//! | Analyzer  | Rule                      | Defect when                          |
//! |-----------|---------------------------|--------------------------------------|
//! | Embedding | [`CosineThresholdRule`]   | similarity < threshold               |
//! | HOG       | [`AllCloseRule`]          | any entry outside tolerance          |
//! | Harris    | [`AllCloseRule`]          | any pixel outside tolerance          |
//! | Keypoints | [`KeypointPresenceRule`]  | at least one keypoint (no reference) |

mod traits;

pub use traits::{
    AllCloseRule, CosineThresholdRule, DefectRule, Judgement, KeypointPresenceRule, StandaloneRule,
};

use crate::error::ComparisonError;
use ndarray::{Array1, ArrayBase, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Elementwise closeness tolerance: `|a - b| <= atol + rtol * |b|`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    /// Create a tolerance from relative and absolute parts
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Check a single pair of values
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(1e-5, 1e-8)
    }
}

fn check_shapes<S1, S2, D>(
    reference: &ArrayBase<S1, D>,
    candidate: &ArrayBase<S2, D>,
) -> Result<(), ComparisonError>
where
    S1: Data,
    S2: Data,
    D: Dimension,
{
    if reference.shape() != candidate.shape() {
        return Err(ComparisonError::ShapeMismatch {
            reference: reference.shape().to_vec(),
            candidate: candidate.shape().to_vec(),
        });
    }
    Ok(())
}

/// True when every candidate entry is close to the matching reference entry.
pub fn all_close<S1, S2, D>(
    reference: &ArrayBase<S1, D>,
    candidate: &ArrayBase<S2, D>,
    tolerance: Tolerance,
) -> Result<bool, ComparisonError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    check_shapes(reference, candidate)?;
    Ok(Zip::from(candidate)
        .and(reference)
        .all(|&c, &r| tolerance.is_close(c, r)))
}

/// Largest absolute elementwise difference
pub fn max_abs_difference<S1, S2, D>(
    reference: &ArrayBase<S1, D>,
    candidate: &ArrayBase<S2, D>,
) -> Result<f64, ComparisonError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    check_shapes(reference, candidate)?;
    Ok(Zip::from(candidate)
        .and(reference)
        .fold(0.0_f64, |acc, &c, &r| acc.max((c - r).abs())))
}

/// Cosine similarity in `[-1, 1]`.
///
/// A zero-length vector has no direction; its similarity to anything is 0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> Result<f32, ComparisonError> {
    check_shapes(a, b)?;

    let dot = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
