//! Input schema for sleep-disorder screening.
//!
//! Twelve measurements collected by the front-end. Raw values arrive as JSON
//! numbers or text and are checked against fixed ranges and category sets
//! before any feature is derived from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    /// Anything else JSON can carry (bool, null, arrays, objects).
    Other(serde_json::Value),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Text(s) => format!("text '{s}'"),
            Self::Other(serde_json::Value::Null) => "null".to_string(),
            Self::Other(serde_json::Value::Bool(b)) => format!("boolean {b}"),
            Self::Other(serde_json::Value::Array(_)) => "a list".to_string(),
            Self::Other(serde_json::Value::Object(_)) => "an object".to_string(),
            Self::Other(v) => v.to_string(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Unvalidated request payload: field name to raw value.
///
/// Keys may be either the canonical field name (`SleepDurationHours`) or the
/// training column name (`Sleep Duration`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput {
    values: BTreeMap<String, RawValue>,
}

impl RawInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Option<RawValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The values a fresh input form starts with.
    ///
    /// Front-ends use this to pre-fill widgets. The validator never falls
    /// back to these; only schema defaults apply to absent fields.
    #[must_use]
    pub fn form_defaults() -> Self {
        Self::new()
            .with(Field::Gender.name(), Gender::Male.as_str())
            .with(Field::Age.name(), 30)
            .with(Field::SleepDurationHours.name(), 7.5)
            .with(Field::Occupation.name(), Occupation::Others.as_str())
            .with(Field::QualityOfSleep.name(), 7)
            .with(Field::PhysicalActivityMinutes.name(), 30)
            .with(Field::StressLevel.name(), 5)
            .with(Field::BmiCategory.name(), BmiCategory::NormalWeight.as_str())
            .with(Field::SystolicBP.name(), 120)
            .with(Field::DiastolicBP.name(), 80)
            .with(Field::HeartRateBpm.name(), 70)
            .with(Field::DailySteps.name(), 10000)
    }
}

/// The twelve input fields, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Gender,
    Age,
    SleepDurationHours,
    Occupation,
    QualityOfSleep,
    PhysicalActivityMinutes,
    StressLevel,
    BmiCategory,
    SystolicBP,
    DiastolicBP,
    HeartRateBpm,
    DailySteps,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Gender,
        Field::Age,
        Field::SleepDurationHours,
        Field::Occupation,
        Field::QualityOfSleep,
        Field::PhysicalActivityMinutes,
        Field::StressLevel,
        Field::BmiCategory,
        Field::SystolicBP,
        Field::DiastolicBP,
        Field::HeartRateBpm,
        Field::DailySteps,
    ];

    /// Canonical name used in requests and error reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::SleepDurationHours => "SleepDurationHours",
            Self::Occupation => "Occupation",
            Self::QualityOfSleep => "QualityOfSleep",
            Self::PhysicalActivityMinutes => "PhysicalActivityMinutes",
            Self::StressLevel => "StressLevel",
            Self::BmiCategory => "BmiCategory",
            Self::SystolicBP => "SystolicBP",
            Self::DiastolicBP => "DiastolicBP",
            Self::HeartRateBpm => "HeartRateBpm",
            Self::DailySteps => "DailySteps",
        }
    }

    /// Column name the transformer artifact was fitted with.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::SleepDurationHours => "Sleep Duration",
            Self::Occupation => "Occupation",
            Self::QualityOfSleep => "Quality of Sleep",
            Self::PhysicalActivityMinutes => "Physical Activity Level",
            Self::StressLevel => "Stress Level",
            Self::BmiCategory => "BMI Category",
            Self::SystolicBP => "Systolic",
            Self::DiastolicBP => "Diastolic",
            Self::HeartRateBpm => "Heart Rate",
            Self::DailySteps => "Daily Steps",
        }
    }

    /// Resolve a request key (canonical name or column name).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key || f.column() == key)
    }

    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        &SCHEMA[self as usize]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const LABELS: [&'static str; 2] = ["Male", "Female"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupation {
    Others,
    Doctor,
    Teacher,
    Nurse,
    Engineer,
    Accountant,
    Lawyer,
    Salesperson,
}

impl Occupation {
    pub const LABELS: [&'static str; 8] = [
        "Others",
        "Doctor",
        "Teacher",
        "Nurse",
        "Engineer",
        "Accountant",
        "Lawyer",
        "Salesperson",
    ];

    const ALL: [Occupation; 8] = [
        Self::Others,
        Self::Doctor,
        Self::Teacher,
        Self::Nurse,
        Self::Engineer,
        Self::Accountant,
        Self::Lawyer,
        Self::Salesperson,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        Self::LABELS[self as usize]
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const LABELS: [&'static str; 3] = ["Normal Weight", "Overweight", "Obese"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalWeight => "Normal Weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Normal Weight" => Some(Self::NormalWeight),
            "Overweight" => Some(Self::Overweight),
            "Obese" => Some(Self::Obese),
            _ => None,
        }
    }
}

/// Value domain of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Whole number in `[min, max]`.
    Integer { min: u32, max: u32 },
    /// Whole number no smaller than `min`, with no upper bound.
    Count { min: u32 },
    /// Real number in `[min, max]`.
    Real { min: f64, max: f64 },
    Category { choices: &'static [&'static str] },
}

impl FieldKind {
    fn range_text(&self) -> String {
        match self {
            Self::Integer { min, max } => format!("[{min}, {max}]"),
            Self::Count { min } => format!("[{min}, ∞)"),
            Self::Real { min, max } => format!("[{min}, {max}]"),
            Self::Category { choices } => choices.join(", "),
        }
    }
}

/// Schema entry for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    pub kind: FieldKind,
    /// Category substituted when the field is absent. Only declared where
    /// the schema allows it.
    pub default: Option<&'static str>,
    /// Guidance shown next to validation failures.
    pub hint: &'static str,
}

pub static SCHEMA: [FieldSpec; 12] = [
    FieldSpec {
        field: Field::Gender,
        kind: FieldKind::Category { choices: &Gender::LABELS },
        default: None,
        hint: "Select Male or Female",
    },
    FieldSpec {
        field: Field::Age,
        kind: FieldKind::Integer { min: 18, max: 100 },
        default: None,
        hint: "Enter your age (18-100 years)",
    },
    FieldSpec {
        field: Field::SleepDurationHours,
        kind: FieldKind::Real { min: 0.0, max: 24.0 },
        default: None,
        hint: "Average sleep duration in hours",
    },
    FieldSpec {
        field: Field::Occupation,
        kind: FieldKind::Category { choices: &Occupation::LABELS },
        default: Some("Others"),
        hint: "Select the occupation closest to yours",
    },
    FieldSpec {
        field: Field::QualityOfSleep,
        kind: FieldKind::Integer { min: 1, max: 10 },
        default: None,
        hint: "Rate your sleep quality (1-10)",
    },
    FieldSpec {
        field: Field::PhysicalActivityMinutes,
        kind: FieldKind::Count { min: 0 },
        default: None,
        hint: "Daily physical activity duration in minutes",
    },
    FieldSpec {
        field: Field::StressLevel,
        kind: FieldKind::Integer { min: 1, max: 10 },
        default: None,
        hint: "Rate your stress level (1-10)",
    },
    FieldSpec {
        field: Field::BmiCategory,
        kind: FieldKind::Category { choices: &BmiCategory::LABELS },
        default: None,
        hint: "Select Normal Weight, Overweight or Obese",
    },
    FieldSpec {
        field: Field::SystolicBP,
        kind: FieldKind::Integer { min: 70, max: 200 },
        default: None,
        hint: "Upper blood pressure number",
    },
    FieldSpec {
        field: Field::DiastolicBP,
        kind: FieldKind::Integer { min: 40, max: 130 },
        default: None,
        hint: "Lower blood pressure number",
    },
    FieldSpec {
        field: Field::HeartRateBpm,
        kind: FieldKind::Integer { min: 40, max: 200 },
        default: None,
        hint: "Resting heart rate in beats per minute",
    },
    FieldSpec {
        field: Field::DailySteps,
        kind: FieldKind::Integer { min: 0, max: 50000 },
        default: None,
        hint: "Average number of steps per day",
    },
];

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    #[error("value is required")]
    Missing,

    #[error("expected {expected}, got {found}")]
    WrongType { expected: &'static str, found: String },

    #[error("{value} is outside the allowed range {range}")]
    OutOfRange { value: String, range: String },

    #[error("'{value}' is not one of: {allowed}")]
    NotAllowed { value: String, allowed: String },

    #[error("unknown field")]
    UnknownField,

    #[error("supplied twice, as '{first}' and '{second}'")]
    Duplicate { first: String, second: String },
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Canonical field name, or the offending key for unknown fields.
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    /// Message suitable for showing next to the offending form field.
    #[must_use]
    pub fn guidance(&self) -> String {
        match Field::from_key(&self.field) {
            Some(field) => format!("{self}. {}.", field.spec().hint),
            None => format!("{self}."),
        }
    }
}

/// Every violation found in one input, in schema order followed by
/// unknown keys in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any error names `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Input that satisfies every schema constraint.
///
/// Only obtainable through [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInput {
    gender: Gender,
    age: u32,
    sleep_duration_hours: f64,
    occupation: Occupation,
    quality_of_sleep: u32,
    physical_activity_minutes: f64,
    stress_level: u32,
    bmi_category: BmiCategory,
    systolic_bp: u32,
    diastolic_bp: u32,
    heart_rate_bpm: u32,
    daily_steps: u32,
}

impl ValidatedInput {
    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }

    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub fn sleep_duration_hours(&self) -> f64 {
        self.sleep_duration_hours
    }

    #[must_use]
    pub fn occupation(&self) -> Occupation {
        self.occupation
    }

    #[must_use]
    pub fn quality_of_sleep(&self) -> u32 {
        self.quality_of_sleep
    }

    /// Whole minutes. Unbounded above, so carried as `f64`.
    #[must_use]
    pub fn physical_activity_minutes(&self) -> f64 {
        self.physical_activity_minutes
    }

    #[must_use]
    pub fn stress_level(&self) -> u32 {
        self.stress_level
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        self.bmi_category
    }

    #[must_use]
    pub fn systolic_bp(&self) -> u32 {
        self.systolic_bp
    }

    #[must_use]
    pub fn diastolic_bp(&self) -> u32 {
        self.diastolic_bp
    }

    #[must_use]
    pub fn heart_rate_bpm(&self) -> u32 {
        self.heart_rate_bpm
    }

    #[must_use]
    pub fn daily_steps(&self) -> u32 {
        self.daily_steps
    }
}

/// A field value after coercion, typed by its field.
#[derive(Debug, Clone, Copy)]
enum Coerced {
    Whole(u32),
    Count(f64),
    Real(f64),
    Gender(Gender),
    Occupation(Occupation),
    Bmi(BmiCategory),
}

fn numeric_value(value: &RawValue) -> Result<f64, ValidationReason> {
    let n = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationReason::WrongType {
            expected: "a number",
            found: value.describe(),
        })?,
        RawValue::Other(_) => {
            return Err(ValidationReason::WrongType {
                expected: "a number",
                found: value.describe(),
            })
        }
    };

    if !n.is_finite() {
        return Err(ValidationReason::WrongType {
            expected: "a finite number",
            found: value.describe(),
        });
    }
    Ok(n)
}

fn whole_value(value: &RawValue) -> Result<f64, ValidationReason> {
    let n = numeric_value(value)?;
    if n.fract() != 0.0 {
        return Err(ValidationReason::WrongType {
            expected: "a whole number",
            found: value.describe(),
        });
    }
    Ok(n)
}

fn out_of_range(spec: &FieldSpec, n: f64) -> ValidationReason {
    ValidationReason::OutOfRange {
        value: n.to_string(),
        range: spec.kind.range_text(),
    }
}

fn coerce(spec: &FieldSpec, value: &RawValue) -> Result<Coerced, ValidationReason> {
    match spec.kind {
        FieldKind::Integer { min, max } => {
            let n = whole_value(value)?;
            if n < f64::from(min) || n > f64::from(max) {
                return Err(out_of_range(spec, n));
            }
            // Whole and within u32 bounds, so the cast is exact.
            Ok(Coerced::Whole(n as u32))
        }
        FieldKind::Count { min } => {
            let n = whole_value(value)?;
            if n < f64::from(min) {
                return Err(out_of_range(spec, n));
            }
            // -0.0 passes a zero minimum; carry it as 0.
            Ok(Coerced::Count(n + 0.0))
        }
        FieldKind::Real { min, max } => {
            let n = numeric_value(value)?;
            if n < min || n > max {
                return Err(out_of_range(spec, n));
            }
            Ok(Coerced::Real(n))
        }
        FieldKind::Category { .. } => {
            let RawValue::Text(s) = value else {
                return Err(ValidationReason::WrongType {
                    expected: "text",
                    found: value.describe(),
                });
            };
            let label = s.as_str();
            let parsed = match spec.field {
                Field::Gender => Gender::from_label(label).map(Coerced::Gender),
                Field::Occupation => Occupation::from_label(label).map(Coerced::Occupation),
                Field::BmiCategory => BmiCategory::from_label(label).map(Coerced::Bmi),
                _ => None,
            };
            parsed.ok_or_else(|| ValidationReason::NotAllowed {
                value: s.clone(),
                allowed: spec.kind.range_text(),
            })
        }
    }
}

/// Resolves supplied keys and coerces fields one at a time, recording a
/// violation for every field that yields no value.
struct Checker<'a> {
    supplied: BTreeMap<Field, (&'a str, &'a RawValue)>,
    errors: Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    fn new(raw: &'a RawInput) -> (Self, Vec<ValidationError>) {
        let mut supplied: BTreeMap<Field, (&str, &RawValue)> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut unknown = Vec::new();

        for (key, value) in raw.iter() {
            match Field::from_key(key) {
                Some(field) => {
                    if let Some((first, _)) = supplied.get(&field) {
                        errors.push(ValidationError::new(
                            field.name(),
                            ValidationReason::Duplicate {
                                first: (*first).to_string(),
                                second: key.to_string(),
                            },
                        ));
                    } else {
                        supplied.insert(field, (key, value));
                    }
                }
                None => unknown.push(ValidationError::new(key, ValidationReason::UnknownField)),
            }
        }
        (Self { supplied, errors }, unknown)
    }

    fn value(&mut self, field: Field) -> Option<Coerced> {
        let spec = field.spec();
        let result = match self.supplied.get(&field) {
            Some((_, value)) => coerce(spec, value),
            None => match spec.default {
                Some(default) => coerce(spec, &RawValue::Text(default.to_string())),
                None => Err(ValidationReason::Missing),
            },
        };
        match result {
            Ok(v) => Some(v),
            Err(reason) => {
                self.errors.push(ValidationError::new(field.name(), reason));
                None
            }
        }
    }

    /// Take a field's value when `pick` accepts its coerced form. A form
    /// that does not fit the field is reported rather than replaced.
    fn take<T>(&mut self, field: Field, pick: fn(Coerced) -> Option<T>) -> Option<T> {
        let coerced = self.value(field)?;
        let picked = pick(coerced);
        if picked.is_none() {
            self.errors.push(ValidationError::new(
                field.name(),
                ValidationReason::WrongType {
                    expected: "a value of this field's kind",
                    found: format!("{coerced:?}"),
                },
            ));
        }
        picked
    }
}

/// Check `raw` against the schema.
///
/// All violations are collected rather than stopping at the first one.
/// Absent fields take their schema default when one is declared; malformed
/// values never do.
///
/// # Errors
/// Returns every [`ValidationError`] found.
pub fn validate(raw: &RawInput) -> Result<ValidatedInput, ValidationErrors> {
    let (mut c, unknown) = Checker::new(raw);

    let whole = |v: Coerced| match v {
        Coerced::Whole(n) => Some(n),
        _ => None,
    };
    let gender = c.take(Field::Gender, |v| match v {
        Coerced::Gender(g) => Some(g),
        _ => None,
    });
    let age = c.take(Field::Age, whole);
    let sleep_duration_hours = c.take(Field::SleepDurationHours, |v| match v {
        Coerced::Real(n) => Some(n),
        _ => None,
    });
    let occupation = c.take(Field::Occupation, |v| match v {
        Coerced::Occupation(o) => Some(o),
        _ => None,
    });
    let quality_of_sleep = c.take(Field::QualityOfSleep, whole);
    let physical_activity_minutes = c.take(Field::PhysicalActivityMinutes, |v| match v {
        Coerced::Count(n) => Some(n),
        _ => None,
    });
    let stress_level = c.take(Field::StressLevel, whole);
    let bmi_category = c.take(Field::BmiCategory, |v| match v {
        Coerced::Bmi(b) => Some(b),
        _ => None,
    });
    let systolic_bp = c.take(Field::SystolicBP, whole);
    let diastolic_bp = c.take(Field::DiastolicBP, whole);
    let heart_rate_bpm = c.take(Field::HeartRateBpm, whole);
    let daily_steps = c.take(Field::DailySteps, whole);

    let mut errors = c.errors;
    // Duplicates were recorded during key resolution; restore schema order.
    errors.sort_by_key(|e| Field::from_key(&e.field).map(|f| f as usize));
    errors.extend(unknown);

    // Every `None` above recorded an error, so an empty list means all
    // twelve values are present.
    match (
        gender,
        age,
        sleep_duration_hours,
        occupation,
        quality_of_sleep,
        physical_activity_minutes,
        stress_level,
        bmi_category,
        systolic_bp,
        diastolic_bp,
        heart_rate_bpm,
        daily_steps,
    ) {
        (
            Some(gender),
            Some(age),
            Some(sleep_duration_hours),
            Some(occupation),
            Some(quality_of_sleep),
            Some(physical_activity_minutes),
            Some(stress_level),
            Some(bmi_category),
            Some(systolic_bp),
            Some(diastolic_bp),
            Some(heart_rate_bpm),
            Some(daily_steps),
        ) if errors.is_empty() => Ok(ValidatedInput {
            gender,
            age,
            sleep_duration_hours,
            occupation,
            quality_of_sleep,
            physical_activity_minutes,
            stress_level,
            bmi_category,
            systolic_bp,
            diastolic_bp,
            heart_rate_bpm,
            daily_steps,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}
