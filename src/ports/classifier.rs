//! Classifier port: Trait for the pre-trained risk model.
//!
//! The model is an opaque collaborator. The application only relies on
//! `predict` mapping each feature vector to a class in {0, 1}, in order.

use crate::domain::FeatureVector;

/// Errors that can occur while evaluating the classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Classifier returned {got} predictions for {expected} rows")]
    OutputLength { expected: usize, got: usize },

    #[error("Classifier evaluation failed: {0}")]
    Evaluation(String),
}

/// Trait for binary classifiers over marker feature vectors.
///
/// Implementations are loaded once and shared read-only, so they must be
/// `Send + Sync` and `predict` must not mutate state.
pub trait Classifier: Send + Sync {
    /// Predict one class per row.
    ///
    /// The output has the same length and order as `rows`; each value is 0
    /// (low risk) or 1 (high risk).
    ///
    /// # Errors
    /// Returns `ClassifierError::Evaluation` if the model cannot be evaluated.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError>;

    /// Short human-readable description (model kind, size) for status display.
    fn describe(&self) -> String;
}

impl<C: Classifier + ?Sized> Classifier for std::sync::Arc<C> {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
        (**self).predict(rows)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
