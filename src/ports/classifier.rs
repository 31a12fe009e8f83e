//! Classifier port: maps a feature vector to a discrete label.

use crate::domain::{FeatureVector, PredictionLabel};

/// Errors raised during inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("feature vector has width {actual}, classifier expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("feature {0} is not finite")]
    NonFinite(usize),

    #[error("model evaluation failed: {0}")]
    Model(String),
}

/// Trait for fitted classifiers.
///
/// Implementations are read-only after loading; `predict` must be
/// deterministic and must not mutate model state.
pub trait Classifier: Send + Sync {
    /// Number of features the model was fitted on.
    fn input_width(&self) -> usize;

    /// Class labels, in the column order of [`Classifier::predict_proba`].
    fn classes(&self) -> &[PredictionLabel];

    /// Per-class probabilities for one feature vector.
    ///
    /// # Errors
    /// Returns [`InferenceError::WidthMismatch`] if `features` has the wrong
    /// width.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError>;

    /// Most probable class. Ties go to the class listed first.
    ///
    /// # Errors
    /// Same as [`Classifier::predict_proba`].
    fn predict(&self, features: &FeatureVector) -> Result<PredictionLabel, InferenceError> {
        let proba = self.predict_proba(features)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in proba.iter().copied().enumerate() {
            match best {
                Some((_, top)) if p <= top => {}
                _ => best = Some((i, p)),
            }
        }
        best.and_then(|(i, _)| self.classes().get(i).copied())
            .ok_or_else(|| InferenceError::Model("classifier returned no probabilities".into()))
    }
}
