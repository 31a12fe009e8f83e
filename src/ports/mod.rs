//! Ports layer: Trait definitions for the fitted artifacts.
//!
//! These traits define the boundary between the pipeline and whatever
//! produced the transformer and classifier.

mod classifier;
mod transformer;

pub use classifier::{Classifier, InferenceError};
pub use transformer::{FeatureTransformer, TransformError};
