//! Random forest adapter: implementation of Classifier.
//!
//! Trees are stored in preorder as flat node lists. A split sends a sample
//! left when `x[feature] <= threshold`. Leaves hold per-class weights that
//! are normalized per tree and averaged across the forest.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, PredictionLabel};
use crate::ports::{Classifier, InferenceError};

pub const CLASSIFIER_FORMAT: &str = "somnolens.classifier";
pub const CLASSIFIER_VERSION: u32 = 1;
pub const RANDOM_FOREST_KIND: &str = "random_forest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn check(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    // Children strictly after their parent: walks always terminate.
                    for child in [*left, *right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {idx} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} class weights, model has {n_classes} classes",
                            value.len()
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {idx} has an invalid weight"));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(format!("leaf {idx} has zero total weight"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_for(&self, x: &[f64]) -> Result<&[f64], InferenceError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x
                        .get(*feature)
                        .ok_or_else(|| InferenceError::Model(format!("feature {feature} out of range")))?;
                    idx = if *v <= *threshold { *left } else { *right };
                }
                None => return Err(InferenceError::Model(format!("dangling node index {idx}"))),
            }
        }
    }
}

/// Random forest classifier exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub format: String,
    pub version: u32,
    pub kind: String,
    pub classes: Vec<PredictionLabel>,
    pub n_features_in: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Check format tags and tree structure.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.format != CLASSIFIER_FORMAT {
            return Err(format!(
                "unexpected format '{}' (expected '{CLASSIFIER_FORMAT}')",
                self.format
            ));
        }
        if self.version != CLASSIFIER_VERSION {
            return Err(format!(
                "unsupported version {} (expected {CLASSIFIER_VERSION})",
                self.version
            ));
        }
        if self.kind != RANDOM_FOREST_KIND {
            return Err(format!("unsupported model kind '{}'", self.kind));
        }
        if self.classes.is_empty() {
            return Err("model declares no classes".into());
        }
        if self.classes.iter().any(|c| !c.value().is_finite()) {
            return Err("class labels must be finite".into());
        }
        if self.n_features_in == 0 {
            return Err("n_features_in must be positive".into());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features_in, self.classes.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn input_width(&self) -> usize {
        self.n_features_in
    }

    fn classes(&self) -> &[PredictionLabel] {
        &self.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.n_features_in {
            return Err(InferenceError::WidthMismatch {
                expected: self.n_features_in,
                actual: features.len(),
            });
        }
        if let Some(idx) = features.first_non_finite() {
            return Err(InferenceError::NonFinite(idx));
        }

        let x = features.as_slice();
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x)?;
            let total: f64 = leaf.iter().sum();
            for (acc, w) in proba.iter_mut().zip(leaf) {
                *acc += w / total;
            }
        }

        let n = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n;
        }
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> RandomForest {
        serde_json::from_str(include_str!("../../artifacts/sleep_disorder_random_forest_model.json"))
            .expect("demo forest parses")
    }

    fn stump(threshold: f64, left: Vec<f64>, right: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> RandomForest {
        RandomForest {
            format: CLASSIFIER_FORMAT.into(),
            version: CLASSIFIER_VERSION,
            kind: RANDOM_FOREST_KIND.into(),
            classes: vec![PredictionLabel(0.0), PredictionLabel(1.0), PredictionLabel(2.0)],
            n_features_in: 1,
            trees,
        }
    }

    #[test]
    fn test_demo_forest_is_valid() {
        let f = demo();
        f.check().expect("valid");
        assert_eq!(f.input_width(), 22);
        assert_eq!(f.trees.len(), 3);
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let f = forest(vec![stump(0.5, vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0])]);
        f.check().expect("valid");
        let label = f.predict(&FeatureVector::new(vec![0.5])).expect("predict");
        assert_eq!(label, PredictionLabel(0.0));
        let label = f.predict(&FeatureVector::new(vec![0.51])).expect("predict");
        assert_eq!(label, PredictionLabel(2.0));
    }

    #[test]
    fn test_probabilities_are_averaged_normalized_leaves() {
        let f = forest(vec![
            stump(0.0, vec![2.0, 2.0, 0.0], vec![0.0, 0.0, 1.0]),
            stump(0.0, vec![0.0, 3.0, 1.0], vec![1.0, 0.0, 0.0]),
        ]);
        let proba = f.predict_proba(&FeatureVector::new(vec![-1.0])).expect("proba");
        assert!((proba[0] - 0.25).abs() < 1e-12);
        assert!((proba[1] - 0.625).abs() < 1e-12);
        assert!((proba[2] - 0.125).abs() < 1e-12);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(f.predict(&FeatureVector::new(vec![-1.0])).expect("predict"), PredictionLabel(1.0));
    }

    #[test]
    fn test_ties_pick_first_class() {
        let f = forest(vec![stump(0.0, vec![1.0, 1.0, 0.0], vec![1.0, 1.0, 0.0])]);
        assert_eq!(f.predict(&FeatureVector::new(vec![3.0])).expect("predict"), PredictionLabel(0.0));
    }

    #[test]
    fn test_width_mismatch() {
        let f = demo();
        let err = f.predict(&FeatureVector::new(vec![0.0; 21])).unwrap_err();
        assert_eq!(
            err,
            InferenceError::WidthMismatch {
                expected: 22,
                actual: 21
            }
        );
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let f = forest(vec![stump(0.0, vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0])]);
        let err = f.predict(&FeatureVector::new(vec![f64::NAN])).unwrap_err();
        assert_eq!(err, InferenceError::NonFinite(0));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let f = demo();
        let x = FeatureVector::new((0..22).map(|i| f64::from(i) * 0.1 - 1.0).collect());
        let first = f.predict(&x).expect("predict");
        for _ in 0..10 {
            assert_eq!(f.predict(&x).expect("predict"), first);
        }
    }

    #[test]
    fn test_structural_checks() {
        let mut f = forest(vec![stump(0.0, vec![1.0, 0.0], vec![0.0, 1.0, 0.0])]);
        assert!(f.check().unwrap_err().contains("class weights"));

        f.trees = vec![DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        }];
        assert!(f.check().unwrap_err().contains("invalid child index"));

        f.trees = vec![stump(0.0, vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0])];
        f.n_features_in = 0;
        assert!(f.check().is_err());

        let mut f = demo();
        f.kind = "gradient_boosting".into();
        assert!(f.check().unwrap_err().contains("gradient_boosting"));

        let mut f = demo();
        if let Some(TreeNode::Split { feature, .. }) = f.trees[0].nodes.first_mut() {
            *feature = 22;
        }
        assert!(f.check().unwrap_err().contains("feature 22"));
    }

    #[test]
    fn test_leaf_nodes_parse_untagged() {
        let tree: DecisionTree = serde_json::from_str(
            r#"{"nodes":[{"feature":0,"threshold":1.5,"left":1,"right":2},{"value":[1,0]},{"value":[0,1]}]}"#,
        )
        .expect("parse");
        assert!(matches!(tree.nodes[0], TreeNode::Split { feature: 0, .. }));
        assert!(matches!(&tree.nodes[2], TreeNode::Leaf { value } if value == &vec![0.0, 1.0]));
    }
}
