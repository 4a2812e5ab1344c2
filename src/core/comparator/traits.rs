//! Trait definitions for defect rules.

use super::{all_close, cosine_similarity, max_abs_difference, Tolerance};
use crate::core::features::KeypointSet;
use crate::error::ComparisonError;
use ndarray::{Array1, ArrayBase, Data, Dimension};

/// Outcome of judging one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgement {
    pub is_defect: bool,
    /// Rule-specific magnitude (similarity, largest difference, keypoint count)
    pub score: f64,
}

/// Decides whether a candidate descriptor deviates from the reference
pub trait DefectRule<D>: Send + Sync {
    /// Judge `candidate` against `reference`
    fn judge(&self, reference: &D, candidate: &D) -> Result<Judgement, ComparisonError>;

    /// Human-readable description of the rule
    fn description(&self) -> String;
}

/// Decides whether a descriptor is defective on its own
pub trait StandaloneRule<D>: Send + Sync {
    /// Judge a single descriptor
    fn judge(&self, descriptor: &D) -> Judgement;

    /// Human-readable description of the rule
    fn description(&self) -> String;
}

/// Flags candidates whose cosine similarity to the reference is below a threshold
#[derive(Debug, Clone)]
pub struct CosineThresholdRule {
    threshold: f32,
}

impl CosineThresholdRule {
    /// Default threshold used when none is given
    pub const DEFAULT_THRESHOLD: f32 = 0.999;

    /// Create a rule with the given threshold
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Get the threshold used
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Default for CosineThresholdRule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl DefectRule<Array1<f32>> for CosineThresholdRule {
    fn judge(
        &self,
        reference: &Array1<f32>,
        candidate: &Array1<f32>,
    ) -> Result<Judgement, ComparisonError> {
        let similarity = cosine_similarity(reference, candidate)?;
        Ok(Judgement {
            is_defect: similarity < self.threshold,
            score: similarity as f64,
        })
    }

    fn description(&self) -> String {
        format!(
            "Cosine rule: similarity below {} is a defect",
            self.threshold
        )
    }
}

/// Flags candidates with any entry outside the tolerance of the reference
#[derive(Debug, Clone, Default)]
pub struct AllCloseRule {
    tolerance: Tolerance,
}

impl AllCloseRule {
    /// Create a rule with the given tolerance
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    /// Get the tolerance used
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

impl<S, D> DefectRule<ArrayBase<S, D>> for AllCloseRule
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn judge(
        &self,
        reference: &ArrayBase<S, D>,
        candidate: &ArrayBase<S, D>,
    ) -> Result<Judgement, ComparisonError> {
        let close = all_close(reference, candidate, self.tolerance)?;
        Ok(Judgement {
            is_defect: !close,
            score: max_abs_difference(reference, candidate)?,
        })
    }

    fn description(&self) -> String {
        format!(
            "All-close rule: |candidate - reference| > {} + {} * |reference| anywhere is a defect",
            self.tolerance.atol, self.tolerance.rtol
        )
    }
}

/// Flags every image with at least one keypoint
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypointPresenceRule;

impl StandaloneRule<KeypointSet> for KeypointPresenceRule {
    fn judge(&self, descriptor: &KeypointSet) -> Judgement {
        Judgement {
            is_defect: !descriptor.is_empty(),
            score: descriptor.len() as f64,
        }
    }

    fn description(&self) -> String {
        "Presence rule: any detected keypoint is a defect".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn cosine_rule_threshold_is_strict() {
        let rule = CosineThresholdRule::new(1.0);
        let v = array![3.0_f32, 4.0];
        let judgement = rule.judge(&v, &v).unwrap();
        assert!(!judgement.is_defect);
        assert!((judgement.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_rule_flags_dissimilar_candidate() {
        let rule = CosineThresholdRule::default();
        let judgement = rule
            .judge(&array![1.0_f32, 0.0], &array![1.0_f32, 1.0])
            .unwrap();
        assert!(judgement.is_defect);
    }

    #[test]
    fn cosine_rule_accepts_scaled_copy() {
        let rule = CosineThresholdRule::default();
        let reference = array![0.2_f32, 0.5, 0.9];
        let judgement = rule.judge(&reference, &reference.mapv(|v| v * 4.0)).unwrap();
        assert!(!judgement.is_defect);
    }

    #[test]
    fn all_close_rule_on_vectors_and_maps() {
        let rule = AllCloseRule::default();

        let reference = array![1.0, 2.0, 3.0];
        assert!(!rule.judge(&reference, &reference.clone()).unwrap().is_defect);
        assert!(rule.judge(&reference, &array![1.0, 2.0, 3.1]).unwrap().is_defect);

        let map = Array2::from_elem((2, 2), 5.0);
        let mut shifted = map.clone();
        shifted[[0, 0]] = 6.0;
        let judgement = rule.judge(&map, &shifted).unwrap();
        assert!(judgement.is_defect);
        assert_eq!(judgement.score, 1.0);
    }

    #[test]
    fn all_close_rule_propagates_shape_mismatch() {
        let rule = AllCloseRule::default();
        let result = rule.judge(&Array2::<f64>::zeros((2, 2)), &Array2::<f64>::zeros((2, 3)));
        assert!(matches!(result, Err(ComparisonError::ShapeMismatch { .. })));
    }

    #[test]
    fn presence_rule_on_empty_set() {
        let judgement = KeypointPresenceRule.judge(&KeypointSet::default());
        assert!(!judgement.is_defect);
        assert_eq!(judgement.score, 0.0);
    }

    #[test]
    fn presence_rule_counts_keypoints() {
        let keypoint = crate::core::features::Keypoint {
            x: 4.0,
            y: 9.0,
            octave: 0,
            layer: 1,
            sigma: 2.0,
            response: 0.1,
        };
        let set = KeypointSet::from(vec![keypoint.clone(), keypoint]);
        let judgement = KeypointPresenceRule.judge(&set);
        assert!(judgement.is_defect);
        assert_eq!(judgement.score, 2.0);
    }
}
