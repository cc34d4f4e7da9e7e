//! Prediction service: the single-record workflow.
//!
//! Encodes a marker panel in fixed order, asks the classifier, and maps the
//! class to a risk label. Nothing is stored; the caller owns the result.

use std::sync::Arc;

use crate::domain::{FeatureVector, InvalidClass, MarkerPanel, Prediction, RiskLabel};
use crate::ports::{Classifier, ClassifierError};

/// Error type for prediction requests.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    InvalidClass(#[from] InvalidClass),
}

/// Service wrapping the shared, read-only classifier handle.
pub struct PredictionService<C: Classifier> {
    classifier: Arc<C>,
}

impl<C: Classifier> Clone for PredictionService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C: Classifier> PredictionService<C> {
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Model description for status display.
    #[must_use]
    pub fn classifier_description(&self) -> String {
        self.classifier.describe()
    }

    /// Predict risk labels for encoded rows, preserving order.
    ///
    /// # Errors
    /// Returns `PredictionError` if the classifier fails, returns the wrong
    /// number of predictions, or returns a class other than 0/1.
    pub fn predict_vectors(&self, rows: &[FeatureVector]) -> Result<Vec<RiskLabel>, PredictionError> {
        let classes = self.classifier.predict(rows)?;
        if classes.len() != rows.len() {
            return Err(ClassifierError::OutputLength {
                expected: rows.len(),
                got: classes.len(),
            }
            .into());
        }

        classes
            .into_iter()
            .map(|c| RiskLabel::from_class(c).map_err(PredictionError::from))
            .collect()
    }

    /// Run the single-record workflow.
    ///
    /// # Errors
    /// Returns `PredictionError` if the classifier cannot produce a valid class.
    pub fn predict_single(&self, panel: &MarkerPanel) -> Result<Prediction, PredictionError> {
        let vector = panel.feature_vector();
        let risk = self
            .predict_vectors(std::slice::from_ref(&vector))?
            .into_iter()
            .next()
            .ok_or(ClassifierError::OutputLength {
                expected: 1,
                got: 0,
            })?;

        tracing::info!(risk = %risk, "Single prediction complete");

        Ok(Prediction::new(*panel, risk))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{ExpressionLevel, Marker, MARKERS};

    /// Returns 0 for the all-zero vector and 1 for anything else.
    pub(crate) struct ZeroIsLow;

    impl Classifier for ZeroIsLow {
        fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
            Ok(rows
                .iter()
                .map(|r| u8::from(r.0.iter().any(|&c| c != 0)))
                .collect())
        }

        fn describe(&self) -> String {
            "zero-is-low stub".to_string()
        }
    }

    /// Misbehaving model used to exercise output checks.
    struct Fixed(Vec<u8>);

    impl Classifier for Fixed {
        fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn service() -> PredictionService<ZeroIsLow> {
        PredictionService::new(Arc::new(ZeroIsLow))
    }

    #[test]
    fn test_all_negative_is_low_risk() {
        let prediction = service()
            .predict_single(&MarkerPanel::default())
            .expect("predicts");
        assert_eq!(prediction.risk, RiskLabel::Low);
        assert_eq!(prediction.inputs, MarkerPanel::default());
    }

    #[test]
    fn test_any_positive_reading_is_high_risk() {
        let svc = service();
        for marker in MARKERS {
            for level in &ExpressionLevel::ALL[1..] {
                let mut panel = MarkerPanel::default();
                panel.set(marker, *level);
                let prediction = svc.predict_single(&panel).expect("predicts");
                assert_eq!(prediction.risk, RiskLabel::High, "{marker} = {level}");
            }
        }
    }

    #[test]
    fn test_echo_keeps_human_readable_inputs() {
        let mut panel = MarkerPanel::default();
        panel.set(Marker::Septin9, ExpressionLevel::Positive4);
        let prediction = service().predict_single(&panel).expect("predicts");

        let echoed: Vec<&str> = prediction.inputs.entries().map(|(_, l)| l.label()).collect();
        assert_eq!(echoed, vec!["Neg", "Pos 4+", "Neg", "Neg", "Neg"]);
    }

    #[test]
    fn test_wrong_output_length_is_error() {
        let svc = PredictionService::new(Arc::new(Fixed(vec![0, 1])));
        let err = svc
            .predict_single(&MarkerPanel::default())
            .expect_err("must fail");
        assert!(matches!(
            err,
            PredictionError::Classifier(ClassifierError::OutputLength { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_non_binary_class_is_error() {
        let svc = PredictionService::new(Arc::new(Fixed(vec![2])));
        let err = svc
            .predict_single(&MarkerPanel::default())
            .expect_err("must fail");
        assert!(matches!(err, PredictionError::InvalidClass(InvalidClass(2))));
    }
}
