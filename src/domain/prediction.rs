//! Prediction result types.
//!
//! Represents the binary classifier output and the per-submission record shown to the user.

use serde::{Deserialize, Serialize};

use super::marker::MarkerPanel;

/// Name of the column appended to batch results.
pub const PREDICTION_COLUMN: &str = "Prediction";

/// The classifier produced something other than 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Classifier returned non-binary class {0}")]
pub struct InvalidClass(pub u8);

/// Binary risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0: the model did not detect cancer risk
    Low,
    /// Class 1: the model detected colon cancer risk
    High,
}

impl RiskLabel {
    /// Map a classifier class to a label.
    ///
    /// # Errors
    /// Returns `InvalidClass` for anything other than 0 or 1.
    pub fn from_class(class: u8) -> Result<Self, InvalidClass> {
        match class {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(InvalidClass(other)),
        }
    }

    /// Classifier class for this label.
    #[must_use]
    pub fn class(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Language-independent label written to result spreadsheets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low-risk",
            Self::High => "high-risk",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129), // Emerald (#10B981)
            Self::High => (244, 63, 94), // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one single-record submission. Lives only in UI state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// The readings as entered, echoed back for confirmation
    pub inputs: MarkerPanel,

    /// Classifier verdict
    pub risk: RiskLabel,

    /// When the prediction was made
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Prediction {
    #[must_use]
    pub fn new(inputs: MarkerPanel, risk: RiskLabel) -> Self {
        Self {
            inputs,
            risk,
            created_at: chrono::Utc::now(),
        }
    }
}
