//! Fitted preprocessor: implementation of FeatureTransformer.
//!
//! Applies the column transformer exported by the training pipeline.
//! Category lists, means and scales are read from the artifact and never
//! refitted, so every run encodes a category to the same position.
//!
//! Output features are emitted step by step, in artifact order:
//! - `one_hot`: one indicator per fitted category
//! - `ordinal`: index of the category in the fitted list
//! - `standard_scale`: `(x - mean) / scale`
//! - `passthrough`: the number unchanged

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Cell, CellKind, FeatureVector, TransformRecord};
use crate::ports::{FeatureTransformer, TransformError};

/// Format tag the artifact must carry.
pub const TRANSFORMER_FORMAT: &str = "somnolens.transformer";

/// Artifact version this adapter reads.
pub const TRANSFORMER_VERSION: u32 = 1;

/// What a one-hot step does with a category it was not fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Emit an all-zero block.
    Ignore,
}

/// One fitted column operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformStep {
    OneHot {
        column: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Ordinal {
        column: String,
        categories: Vec<String>,
    },
    StandardScale {
        column: String,
        mean: f64,
        scale: f64,
    },
    Passthrough {
        column: String,
    },
}

impl TransformStep {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::OneHot { column, .. }
            | Self::Ordinal { column, .. }
            | Self::StandardScale { column, .. }
            | Self::Passthrough { column } => column,
        }
    }

    /// Number of features this step contributes.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::OneHot { categories, .. } => categories.len(),
            _ => 1,
        }
    }

    /// Kind of record cell the step consumes.
    #[must_use]
    pub fn input_kind(&self) -> CellKind {
        match self {
            Self::OneHot { .. } | Self::Ordinal { .. } => CellKind::Category,
            Self::StandardScale { .. } | Self::Passthrough { .. } => CellKind::Number,
        }
    }

    fn feature_names(&self) -> Vec<String> {
        match self {
            Self::OneHot {
                column, categories, ..
            } => categories.iter().map(|c| format!("{column}_{c}")).collect(),
            other => vec![other.column().to_string()],
        }
    }

    fn check(&self) -> Result<(), String> {
        match self {
            Self::OneHot {
                column, categories, ..
            }
            | Self::Ordinal { column, categories } => {
                if categories.is_empty() {
                    return Err(format!("step for '{column}' has no categories"));
                }
                let unique: BTreeSet<&String> = categories.iter().collect();
                if unique.len() != categories.len() {
                    return Err(format!("step for '{column}' repeats a category"));
                }
            }
            Self::StandardScale {
                column,
                mean,
                scale,
            } => {
                if !mean.is_finite() || !scale.is_finite() || *scale <= 0.0 {
                    return Err(format!(
                        "step for '{column}' has invalid scaling (mean={mean}, scale={scale})"
                    ));
                }
            }
            Self::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn apply(&self, record: &TransformRecord, out: &mut Vec<f64>) -> Result<(), TransformError> {
        let column = self.column();
        let cell = record
            .get(column)
            .ok_or_else(|| TransformError::MissingColumn(column.to_string()))?;

        match (self, cell) {
            (
                Self::OneHot {
                    categories,
                    handle_unknown,
                    ..
                },
                Cell::Category(value),
            ) => {
                let hit = categories.iter().position(|c| c == value);
                if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                    return Err(unknown_category(column, value));
                }
                out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
            }
            (Self::Ordinal { categories, .. }, Cell::Category(value)) => {
                let idx = categories
                    .iter()
                    .position(|c| c == value)
                    .ok_or_else(|| unknown_category(column, value))?;
                out.push(idx as f64);
            }
            (Self::StandardScale { mean, scale, .. }, Cell::Number(x)) => {
                out.push((x - mean) / scale);
            }
            (Self::Passthrough { .. }, Cell::Number(x)) => out.push(x),
            (step, cell) => {
                return Err(TransformError::KindMismatch {
                    column: column.to_string(),
                    expected: step.input_kind(),
                    found: cell.kind(),
                })
            }
        }
        Ok(())
    }
}

fn unknown_category(column: &str, value: &str) -> TransformError {
    TransformError::UnknownCategory {
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Column transformer parameters exported by the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    pub format: String,
    pub version: u32,
    pub input_columns: Vec<String>,
    pub steps: Vec<TransformStep>,
    pub n_features_out: usize,
}

impl FittedPreprocessor {
    /// Check internal consistency and that the fitted columns are exactly
    /// `expected`, each consumed by a step of matching kind.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn check_compatible(&self, expected: &[(&str, CellKind)]) -> Result<(), String> {
        if self.format != TRANSFORMER_FORMAT {
            return Err(format!(
                "unexpected format '{}' (expected '{TRANSFORMER_FORMAT}')",
                self.format
            ));
        }
        if self.version != TRANSFORMER_VERSION {
            return Err(format!(
                "unsupported version {} (expected {TRANSFORMER_VERSION})",
                self.version
            ));
        }

        let declared: BTreeSet<&str> = self.input_columns.iter().map(String::as_str).collect();
        if declared.len() != self.input_columns.len() {
            return Err("input_columns contains duplicates".into());
        }
        let wanted: BTreeSet<&str> = expected.iter().map(|(c, _)| *c).collect();
        if declared != wanted {
            let missing: Vec<&str> = wanted.difference(&declared).copied().collect();
            let extra: Vec<&str> = declared.difference(&wanted).copied().collect();
            return Err(format!(
                "input columns do not match the input schema (missing: {missing:?}, unexpected: {extra:?})"
            ));
        }

        let mut consumed = BTreeSet::new();
        for step in &self.steps {
            step.check()?;
            let column = step.column();
            let kind = expected
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, k)| *k)
                .ok_or_else(|| format!("step references undeclared column '{column}'"))?;
            if kind != step.input_kind() {
                return Err(format!(
                    "step for '{column}' expects {:?} input but the column holds {kind:?}",
                    step.input_kind()
                ));
            }
            consumed.insert(column);
        }
        if let Some(unused) = wanted.iter().find(|c| !consumed.contains(*c)) {
            return Err(format!("no step consumes column '{unused}'"));
        }

        let width: usize = self.steps.iter().map(TransformStep::width).sum();
        if width != self.n_features_out {
            return Err(format!(
                "steps produce {width} features but n_features_out is {}",
                self.n_features_out
            ));
        }
        Ok(())
    }
}

impl FeatureTransformer for FittedPreprocessor {
    fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    fn output_width(&self) -> usize {
        self.n_features_out
    }

    fn feature_names(&self) -> Vec<String> {
        self.steps.iter().flat_map(TransformStep::feature_names).collect()
    }

    fn transform(&self, record: &TransformRecord) -> Result<FeatureVector, TransformError> {
        let mut out = Vec::with_capacity(self.n_features_out);
        for step in &self.steps {
            step.apply(record, &mut out)?;
        }

        if out.len() != self.n_features_out {
            return Err(TransformError::WidthMismatch {
                expected: self.n_features_out,
                actual: out.len(),
            });
        }

        let features = FeatureVector::new(out);
        if let Some(idx) = features.first_non_finite() {
            let name = self
                .feature_names()
                .get(idx)
                .cloned()
                .unwrap_or_else(|| idx.to_string());
            return Err(TransformError::NonFinite(name));
        }
        Ok(features)
    }
}
