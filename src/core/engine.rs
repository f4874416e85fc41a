use crate::core::forest::RandomForest;
use crate::domain::model::{FeatureVector, PredictionResult};
use crate::domain::ports::Classifier;
use crate::utils::error::PipelineError;
use std::fmt;
use std::path::Path;

enum EngineState {
    Ready(Box<dyn Classifier>),
    Unavailable { reason: String },
}

/// Read-only handle to the model, built once at startup. An engine that
/// failed to load stays unavailable for the life of the process.
pub struct PredictionEngine {
    state: EngineState,
}

impl PredictionEngine {
    /// 載入失敗不會中止程式，改為降級模式
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match RandomForest::from_file(&path) {
            Ok(forest) => {
                tracing::info!(
                    "✅ Model loaded from {} ({} trees, {} classes, {} features)",
                    path.as_ref().display(),
                    forest.tree_count(),
                    forest.classes().len(),
                    forest.n_features()
                );
                Self::from_classifier(forest)
            }
            Err(e) => {
                tracing::error!("❌ {}", e);
                tracing::error!("💡 {}", e.recovery_suggestion());
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_classifier(classifier: impl Classifier + 'static) -> Self {
        Self {
            state: EngineState::Ready(Box::new(classifier)),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            EngineState::Ready(_) => None,
            EngineState::Unavailable { reason } => Some(reason),
        }
    }

    pub fn input_width(&self) -> Option<usize> {
        match &self.state {
            EngineState::Ready(classifier) => Some(classifier.input_width()),
            EngineState::Unavailable { .. } => None,
        }
    }

    pub fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, PipelineError> {
        let classifier = match &self.state {
            EngineState::Ready(classifier) => classifier,
            EngineState::Unavailable { reason } => {
                return Err(PipelineError::EngineUnavailable {
                    reason: reason.clone(),
                })
            }
        };

        if vector.len() != classifier.input_width() {
            return Err(PipelineError::PredictionFailed {
                detail: format!(
                    "vector has {} values, model expects {}",
                    vector.len(),
                    classifier.input_width()
                ),
            });
        }

        let label = classifier
            .predict(vector.as_slice())
            .map_err(|e| PipelineError::PredictionFailed {
                detail: e.to_string(),
            })?;

        Ok(PredictionResult { label })
    }
}

impl fmt::Debug for PredictionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            EngineState::Ready(classifier) => f
                .debug_struct("PredictionEngine")
                .field("input_width", &classifier.input_width())
                .finish(),
            EngineState::Unavailable { reason } => f
                .debug_struct("PredictionEngine")
                .field("unavailable", reason)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FeatureSchema;
    use crate::utils::error::{AdvisorError, Result};

    struct FixedLabel(&'static str);

    impl Classifier for FixedLabel {
        fn input_width(&self) -> usize {
            4
        }

        fn predict(&self, _features: &[f64]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Rejecting;

    impl Classifier for Rejecting {
        fn input_width(&self) -> usize {
            3
        }

        fn predict(&self, _features: &[f64]) -> Result<String> {
            Err(AdvisorError::ModelError {
                message: "value out of training range".to_string(),
            })
        }
    }

    fn vector(values: Vec<f64>) -> FeatureVector {
        FeatureVector {
            schema: FeatureSchema::FourFeature,
            values,
        }
    }

    #[test]
    fn test_missing_artifact_degrades() {
        let engine = PredictionEngine::load("no/such/RandomForest.json");
        assert!(!engine.is_available());
        assert!(engine.unavailable_reason().is_some());
        assert!(engine.input_width().is_none());

        let err = engine.predict(&vector(vec![30.0, 80.0, 6.0, 2.5])).unwrap_err();
        assert!(matches!(err, PipelineError::EngineUnavailable { .. }));
    }

    #[test]
    fn test_load_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RandomForest.json");
        std::fs::write(
            &path,
            r#"{"n_features": 4, "classes": ["rice"], "trees": [{"nodes": [{"class": 0}]}]}"#,
        )
        .unwrap();

        let engine = PredictionEngine::load(&path);
        assert!(engine.is_available());
        assert_eq!(engine.input_width(), Some(4));
        assert_eq!(
            engine.predict(&vector(vec![30.0, 80.0, 6.0, 2.5])).unwrap().label,
            "rice"
        );
    }

    #[test]
    fn test_predict_is_idempotent() {
        let engine = PredictionEngine::from_classifier(FixedLabel("Rice"));
        let v = vector(vec![30.0, 80.0, 6.0, 2.5]);
        let first = engine.predict(&v).unwrap();
        assert_eq!(engine.predict(&v).unwrap(), first);
        assert_eq!(first.label, "Rice");
    }

    #[test]
    fn test_shape_mismatch_is_prediction_failure() {
        let engine = PredictionEngine::from_classifier(FixedLabel("Rice"));
        let err = engine.predict(&vector(vec![30.0, 80.0, 2.5])).unwrap_err();
        assert!(matches!(err, PipelineError::PredictionFailed { .. }));
    }

    #[test]
    fn test_model_rejection_is_surfaced() {
        let engine = PredictionEngine::from_classifier(Rejecting);
        let err = engine
            .predict(&FeatureVector {
                schema: FeatureSchema::ThreeFeature,
                values: vec![1.0, 2.0, 3.0],
            })
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::PredictionFailed {
                detail: "Model rejected input: value out of training range".to_string()
            }
        );
    }
}
