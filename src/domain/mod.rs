//! Domain layer: input schema, feature records and disorder results.
//!
//! Pure types with no I/O. Validation lives here so every adapter sees the
//! same constraints.

mod disorder;
mod features;
mod input;

pub use disorder::{
    map_result, Assessment, Disorder, DisorderResult, PredictionLabel, SeverityColor,
};
pub use features::{
    sleep_duration_sqrt, Cell, CellKind, FeatureVector, TransformRecord, RECORD_COLUMNS,
    SLEEP_DURATION_SQRT_COLUMN,
};
pub use input::{
    validate, BmiCategory, Field, FieldKind, FieldSpec, Gender, Occupation, RawInput, RawValue,
    ValidatedInput, ValidationError, ValidationErrors, ValidationReason, SCHEMA,
};
