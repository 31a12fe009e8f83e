//! Analysis service: validate -> transform -> predict -> map.
//!
//! Each request runs the four stages in order and stops at the first one
//! that fails. The service holds only shared immutable artifacts, so one
//! instance can serve any number of threads.

use std::fmt;
use std::sync::Arc;

use crate::adapters::forest::RandomForest;
use crate::adapters::preprocessor::FittedPreprocessor;
use crate::adapters::Artifacts;
use crate::domain::{
    validate, Assessment, FeatureVector, PredictionLabel, RawInput, TransformRecord,
    ValidatedInput, ValidationErrors,
};
use crate::ports::{Classifier, FeatureTransformer, InferenceError, TransformError};

/// Shown to the user for any failure they cannot fix themselves.
pub const GENERIC_FAILURE_MESSAGE: &str = "Could not complete analysis. Please try again later.";

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Transform,
    Inference,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transform => "transform",
            Self::Inference => "inference",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("feature transformation failed: {0}")]
    Transform(#[from] TransformError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl AnalysisError {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Validation,
            Self::Transform(_) => Stage::Transform,
            Self::Inference(_) => Stage::Inference,
        }
    }

    /// Whether the caller can fix this by correcting the input.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message safe to show the user: per-field guidance for invalid input,
    /// otherwise [`GENERIC_FAILURE_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors
                .iter()
                .map(|e| e.guidance())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Transform(_) | Self::Inference(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Runs the analysis pipeline over one transformer/classifier pair.
pub struct AnalysisService<T, C>
where
    T: FeatureTransformer,
    C: Classifier,
{
    transformer: Arc<T>,
    classifier: Arc<C>,
}

impl<T, C> Clone for AnalysisService<T, C>
where
    T: FeatureTransformer,
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            transformer: Arc::clone(&self.transformer),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl AnalysisService<FittedPreprocessor, RandomForest> {
    #[must_use]
    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        let (transformer, classifier) = artifacts.into_parts();
        Self::new(transformer, classifier)
    }
}

impl<T, C> AnalysisService<T, C>
where
    T: FeatureTransformer,
    C: Classifier,
{
    pub fn new(transformer: Arc<T>, classifier: Arc<C>) -> Self {
        Self {
            transformer,
            classifier,
        }
    }

    /// # Errors
    /// Returns every violated field constraint.
    pub fn validate(&self, raw: &RawInput) -> Result<ValidatedInput, ValidationErrors> {
        validate(raw)
    }

    /// Derive the sleep-duration feature and encode the record.
    ///
    /// # Errors
    /// Returns error if the transformer rejects the record or emits a vector
    /// of the wrong width.
    pub fn transform(&self, input: &ValidatedInput) -> Result<FeatureVector, TransformError> {
        let record = TransformRecord::from_input(input);
        let features = self.transformer.transform(&record)?;
        if features.len() != self.transformer.output_width() {
            return Err(TransformError::WidthMismatch {
                expected: self.transformer.output_width(),
                actual: features.len(),
            });
        }
        Ok(features)
    }

    /// # Errors
    /// Returns error if the classifier rejects the vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionLabel, InferenceError> {
        self.classifier.predict(features)
    }

    /// Run the whole pipeline for one request.
    ///
    /// # Errors
    /// Returns the first failing stage's error.
    pub fn analyze(&self, raw: &RawInput) -> Result<Assessment, AnalysisError> {
        let result = self.run(raw);
        match &result {
            Ok(assessment) => tracing::info!(
                id = %assessment.id,
                result = %assessment.result.disorder,
                "analysis complete"
            ),
            Err(e) if e.is_user_error() => {
                let fields: Vec<&str> = e
                    .validation_errors()
                    .map(|errs| errs.iter().map(|v| v.field.as_str()).collect())
                    .unwrap_or_default();
                tracing::info!(?fields, "analysis rejected invalid input");
            }
            Err(e) => tracing::error!(stage = %e.stage(), error = %e, "analysis failed"),
        }
        result
    }

    fn run(&self, raw: &RawInput) -> Result<Assessment, AnalysisError> {
        let input = self.validate(raw)?;
        tracing::debug!(stage = %Stage::Validation, "stage complete");

        let features = self.transform(&input)?;
        tracing::debug!(stage = %Stage::Transform, width = features.len(), "stage complete");

        let label = self.predict(&features)?;
        tracing::debug!(stage = %Stage::Inference, %label, "stage complete");

        Ok(Assessment::new(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ArtifactLoader;
    use crate::domain::{Disorder, SeverityColor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn demo_service() -> AnalysisService<FittedPreprocessor, RandomForest> {
        let artifacts = ArtifactLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/artifacts"))
            .load()
            .expect("demo artifacts load");
        AnalysisService::from_artifacts(artifacts)
    }

    fn scenario_a() -> RawInput {
        RawInput::new()
            .with("Gender", "Male")
            .with("Age", 30)
            .with("SleepDurationHours", 7.5)
            .with("Occupation", "Engineer")
            .with("QualityOfSleep", 7)
            .with("PhysicalActivityMinutes", 30)
            .with("StressLevel", 5)
            .with("BmiCategory", "Normal Weight")
            .with("SystolicBP", 120)
            .with("DiastolicBP", 80)
            .with("HeartRateBpm", 70)
            .with("DailySteps", 10000)
    }

    /// Classifier returning a fixed label and counting calls.
    struct FixedClassifier {
        label: PredictionLabel,
        width: usize,
        classes: Vec<PredictionLabel>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(label: f64, width: usize) -> Self {
            Self {
                label: PredictionLabel(label),
                width,
                classes: vec![PredictionLabel(label)],
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn input_width(&self) -> usize {
            self.width
        }

        fn classes(&self) -> &[PredictionLabel] {
            &self.classes
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            Ok(vec![1.0])
        }

        fn predict(&self, _features: &FeatureVector) -> Result<PredictionLabel, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label)
        }
    }

    /// Transformer that counts calls and optionally fails.
    struct CountingTransformer {
        fail: bool,
        calls: AtomicUsize,
        columns: Vec<String>,
    }

    impl CountingTransformer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
                columns: Vec::new(),
            }
        }
    }

    impl FeatureTransformer for CountingTransformer {
        fn input_columns(&self) -> &[String] {
            &self.columns
        }

        fn output_width(&self) -> usize {
            2
        }

        fn feature_names(&self) -> Vec<String> {
            vec!["a".into(), "b".into()]
        }

        fn transform(&self, _record: &TransformRecord) -> Result<FeatureVector, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransformError::UnknownCategory {
                    column: "Occupation".into(),
                    value: "Pilot".into(),
                });
            }
            Ok(FeatureVector::new(vec![0.0, 1.0]))
        }
    }

    #[test]
    fn test_scenario_a_completes() {
        let assessment = demo_service().analyze(&scenario_a()).expect("analysis");
        assert!(["Insomnia", "No Disorder", "Sleep Apnea"].contains(&assessment.result.name()));
        assert_eq!(assessment.result.disorder, Disorder::NoDisorder);
        assert_eq!(assessment.label, PredictionLabel(1.0));
    }

    #[test]
    fn test_scenario_b_underage_fails_validation() {
        let raw = scenario_a().with("Age", 17);
        let err = demo_service().analyze(&raw).unwrap_err();
        assert_eq!(err.stage(), Stage::Validation);
        assert!(err.is_user_error());
        let errors = err.validation_errors().expect("validation errors");
        assert_eq!(errors.first().map(|e| e.field.as_str()), Some("Age"));
        assert!(err.user_message().starts_with("Age"));
    }

    #[test]
    fn test_scenario_c_fixed_label_maps_no_disorder() {
        let service = AnalysisService::new(
            Arc::new(CountingTransformer::new(false)),
            Arc::new(FixedClassifier::new(1.0, 2)),
        );
        let assessment = service.analyze(&scenario_a()).expect("analysis");
        assert_eq!(assessment.result.name(), "No Disorder");
        assert_eq!(assessment.result.color, SeverityColor::Green);
        assert_eq!(assessment.result.recommendations.len(), 4);
    }

    #[test]
    fn test_validation_failure_short_circuits() {
        let transformer = Arc::new(CountingTransformer::new(false));
        let classifier = Arc::new(FixedClassifier::new(1.0, 2));
        let service = AnalysisService::new(Arc::clone(&transformer), Arc::clone(&classifier));

        let mut raw = scenario_a();
        raw.remove("Gender");
        let err = service.analyze(&raw).unwrap_err();
        assert_eq!(err.stage(), Stage::Validation);
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transform_failure_is_system_error() {
        let transformer = Arc::new(CountingTransformer::new(true));
        let classifier = Arc::new(FixedClassifier::new(1.0, 2));
        let service = AnalysisService::new(Arc::clone(&transformer), Arc::clone(&classifier));

        let err = service.analyze(&scenario_a()).unwrap_err();
        assert_eq!(err.stage(), Stage::Transform);
        assert!(!err.is_user_error());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.validation_errors().is_none());
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_inference_width_mismatch_is_system_error() {
        let service = AnalysisService::new(
            Arc::new(CountingTransformer::new(false)),
            Arc::new(demo_service().classifier.as_ref().clone()),
        );
        let err = service.analyze(&scenario_a()).unwrap_err();
        assert_eq!(err.stage(), Stage::Inference);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_unknown_label_maps_unknown() {
        let service = AnalysisService::new(
            Arc::new(CountingTransformer::new(false)),
            Arc::new(FixedClassifier::new(7.0, 2)),
        );
        let assessment = service.analyze(&scenario_a()).expect("analysis");
        assert_eq!(assessment.result.disorder, Disorder::Unknown);
        assert!(assessment.result.recommendations.is_empty());
    }

    #[test]
    fn test_demo_insomnia_and_apnea() {
        let service = demo_service();

        let insomnia = scenario_a()
            .with("BmiCategory", "Overweight")
            .with("SleepDurationHours", 5)
            .with("StressLevel", 8)
            .with("SystolicBP", 125);
        let assessment = service.analyze(&insomnia).expect("analysis");
        assert_eq!(assessment.result.disorder, Disorder::Insomnia);
        assert_eq!(assessment.result.color, SeverityColor::Red);

        let apnea = scenario_a()
            .with("BmiCategory", "Obese")
            .with("SleepDurationHours", 7)
            .with("StressLevel", 8)
            .with("SystolicBP", 140);
        let assessment = service.analyze(&apnea).expect("analysis");
        assert_eq!(assessment.result.disorder, Disorder::SleepApnea);
    }

    #[test]
    fn test_default_occupation_flows_through() {
        let mut raw = scenario_a();
        raw.remove("Occupation");
        let assessment = demo_service().analyze(&raw).expect("analysis");
        assert_eq!(assessment.result.disorder, Disorder::NoDisorder);
    }

    #[test]
    fn test_stages_are_deterministic() {
        let service = demo_service();
        let input = service.validate(&scenario_a()).expect("valid");
        let first = service.transform(&input).expect("transform");
        let second = service.transform(&input).expect("transform");
        assert_eq!(first, second);
        assert_eq!(first.len(), 22);
        assert_eq!(
            service.predict(&first).expect("predict"),
            service.predict(&second).expect("predict")
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let service = Arc::new(demo_service());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    service
                        .analyze(&scenario_a())
                        .map(|a| a.label)
                        .expect("analysis")
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), PredictionLabel(1.0));
        }
    }
}
