//! Feature-side types: the record handed to the fitted transformer and the
//! numeric vector it produces.

use serde::{Deserialize, Serialize};

use super::input::{Field, ValidatedInput};

/// Column that replaces `Sleep Duration` in the transformer record.
pub const SLEEP_DURATION_SQRT_COLUMN: &str = "Sleep Duration Sqrt";

/// Whether a record column carries a category label or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Category,
    Number,
}

/// Columns of a [`TransformRecord`], in the order the training frame had them.
pub const RECORD_COLUMNS: [(&str, CellKind); 12] = [
    ("Gender", CellKind::Category),
    ("Age", CellKind::Number),
    ("Occupation", CellKind::Category),
    ("Quality of Sleep", CellKind::Number),
    ("Physical Activity Level", CellKind::Number),
    ("Stress Level", CellKind::Number),
    ("BMI Category", CellKind::Category),
    ("Systolic", CellKind::Number),
    ("Diastolic", CellKind::Number),
    ("Heart Rate", CellKind::Number),
    ("Daily Steps", CellKind::Number),
    (SLEEP_DURATION_SQRT_COLUMN, CellKind::Number),
];

/// Square-root rescaling applied to sleep duration before transformation.
///
/// Inputs are validated non-negative, so `sqrt(0) = 0` is the only edge.
#[must_use]
pub fn sleep_duration_sqrt(hours: f64) -> f64 {
    hours.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Category(&'static str),
    Number(f64),
}

impl Cell {
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Category(_) => CellKind::Category,
            Self::Number(_) => CellKind::Number,
        }
    }
}

/// One row as the transformer sees it: eleven input fields under their
/// training column names, plus [`SLEEP_DURATION_SQRT_COLUMN`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRecord {
    cells: Vec<(&'static str, Cell)>,
}

impl TransformRecord {
    /// Derive the record from validated input. The raw sleep hours are
    /// dropped; only their square root is carried.
    #[must_use]
    pub fn from_input(input: &ValidatedInput) -> Self {
        let num = |v: u32| Cell::Number(f64::from(v));
        let cells = vec![
            (Field::Gender.column(), Cell::Category(input.gender().as_str())),
            (Field::Age.column(), num(input.age())),
            (Field::Occupation.column(), Cell::Category(input.occupation().as_str())),
            (Field::QualityOfSleep.column(), num(input.quality_of_sleep())),
            (
                Field::PhysicalActivityMinutes.column(),
                Cell::Number(input.physical_activity_minutes()),
            ),
            (Field::StressLevel.column(), num(input.stress_level())),
            (Field::BmiCategory.column(), Cell::Category(input.bmi_category().as_str())),
            (Field::SystolicBP.column(), num(input.systolic_bp())),
            (Field::DiastolicBP.column(), num(input.diastolic_bp())),
            (Field::HeartRateBpm.column(), num(input.heart_rate_bpm())),
            (Field::DailySteps.column(), num(input.daily_steps())),
            (
                SLEEP_DURATION_SQRT_COLUMN,
                Cell::Number(sleep_duration_sqrt(input.sleep_duration_hours())),
            ),
        ];
        Self { cells }
    }

    /// Build a record from arbitrary cells. Used to exercise transformers
    /// with shapes validated input never produces.
    #[must_use]
    pub fn from_cells(cells: Vec<(&'static str, Cell)>) -> Self {
        Self { cells }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<Cell> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, cell)| *cell)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(name, _)| *name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Classifier input. Width and order are owned by the transformer artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Index of the first NaN or infinite value, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|v| !v.is_finite())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::input::{validate, RawInput};

    #[test]
    fn test_sleep_duration_sqrt() {
        assert!(sleep_duration_sqrt(0.0).abs() < f64::EPSILON);
        assert!((sleep_duration_sqrt(9.0) - 3.0).abs() < f64::EPSILON);
        assert!((sleep_duration_sqrt(7.5) - 2.7386).abs() < 1e-4);
    }

    #[test]
    fn test_record_replaces_sleep_hours() {
        let input = validate(&RawInput::form_defaults().with("SleepDurationHours", 9.0))
            .expect("Should validate");
        let record = TransformRecord::from_input(&input);

        assert_eq!(record.len(), RECORD_COLUMNS.len());
        assert!(record.get("Sleep Duration").is_none());
        assert_eq!(record.get(SLEEP_DURATION_SQRT_COLUMN), Some(Cell::Number(3.0)));
        assert_eq!(record.get("Gender"), Some(Cell::Category("Male")));
        assert_eq!(record.get("Daily Steps"), Some(Cell::Number(10000.0)));
    }

    #[test]
    fn test_record_column_order_matches_contract() {
        let input = validate(&RawInput::form_defaults()).expect("Should validate");
        let record = TransformRecord::from_input(&input);
        let expected: Vec<&str> = RECORD_COLUMNS.iter().map(|(c, _)| *c).collect();
        assert_eq!(record.columns().collect::<Vec<_>>(), expected);

        for (column, kind) in RECORD_COLUMNS {
            assert_eq!(record.get(column).map(|c| c.kind()), Some(kind));
        }
    }

    #[test]
    fn test_first_non_finite() {
        assert_eq!(FeatureVector::new(vec![1.0, 2.0]).first_non_finite(), None);
        assert_eq!(
            FeatureVector::new(vec![1.0, f64::NAN, f64::INFINITY]).first_non_finite(),
            Some(1)
        );
    }
}
