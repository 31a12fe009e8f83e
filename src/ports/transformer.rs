//! Feature transformer port: applies fitted encodings and scalings.
//!
//! This trait abstracts the preprocessing artifact from the pipeline. An
//! implementation is fitted once by the training pipeline and only ever
//! applied here.

use crate::domain::{FeatureVector, TransformRecord};

/// Errors raised while turning a record into features.
///
/// These indicate drift between the input schema and the loaded artifact,
/// never a user mistake.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("record has no column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' holds a {found:?} value, expected {expected:?}")]
    KindMismatch {
        column: String,
        expected: crate::domain::CellKind,
        found: crate::domain::CellKind,
    },

    #[error("column '{column}' has category '{value}' that was not seen during fitting")]
    UnknownCategory { column: String, value: String },

    #[error("feature '{0}' is not finite")]
    NonFinite(String),

    #[error("transformer produced {actual} features, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}

/// Trait for fitted feature transformers.
pub trait FeatureTransformer: Send + Sync {
    /// Record columns the transformer was fitted on.
    fn input_columns(&self) -> &[String];

    /// Width of every vector returned by [`FeatureTransformer::transform`].
    fn output_width(&self) -> usize;

    /// Names of the output features, in vector order.
    fn feature_names(&self) -> Vec<String>;

    /// Encode and scale one record.
    ///
    /// # Errors
    /// Returns a [`TransformError`] if the record does not have the shape the
    /// transformer was fitted on.
    fn transform(&self, record: &TransformRecord) -> Result<FeatureVector, TransformError>;
}
