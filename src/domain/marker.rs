//! Gene markers and the per-record feature vector.
//!
//! The classifier was trained on five methylation markers in a fixed order.
//! That order is an external contract: `MARKERS` and `FeatureVector` must never
//! be reordered.

use serde::{Deserialize, Serialize};

use super::expression::{EncodingError, ExpressionLevel};

/// Number of markers in a feature vector.
pub const MARKER_COUNT: usize = 5;

/// One of the five gene markers required for prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    Tfpi2,
    Septin9,
    Sdc2,
    Sfrp2,
    Hoxa2,
}

/// Markers in training order.
pub const MARKERS: [Marker; MARKER_COUNT] = [
    Marker::Tfpi2,
    Marker::Septin9,
    Marker::Sdc2,
    Marker::Sfrp2,
    Marker::Hoxa2,
];

impl Marker {
    /// Exact spreadsheet column header for this marker.
    #[must_use]
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Tfpi2 => "TFPI2 SET-1",
            Self::Septin9 => "SEPTIN9 SET-1 R1",
            Self::Sdc2 => "SDC2 SET-3",
            Self::Sfrp2 => "SFRP2 SET1 (40)",
            Self::Hoxa2 => "HOXA2 SET1",
        }
    }

    /// Position of this marker in the feature vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Column headers in training order.
#[must_use]
pub fn column_names() -> [&'static str; MARKER_COUNT] {
    MARKERS.map(Marker::column_name)
}

/// Encoded classifier input: one code per marker, in `MARKERS` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector(pub [u8; MARKER_COUNT]);

impl FeatureVector {
    /// Codes as floating point values for model evaluation.
    #[must_use]
    pub fn to_f64(&self) -> [f64; MARKER_COUNT] {
        self.0.map(f64::from)
    }

    /// Decode back into a marker panel.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCode` if any code is outside 0-9.
    pub fn decode(&self) -> Result<MarkerPanel, EncodingError> {
        let mut levels = [ExpressionLevel::default(); MARKER_COUNT];
        for (slot, code) in levels.iter_mut().zip(self.0) {
            *slot = ExpressionLevel::from_code(code)?;
        }
        Ok(MarkerPanel { levels })
    }
}

/// One record of marker readings, as selected in the single-record form.
///
/// Every slot holds a valid `ExpressionLevel`, so a panel always encodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPanel {
    levels: [ExpressionLevel; MARKER_COUNT],
}

impl MarkerPanel {
    /// Build a panel from levels in `MARKERS` order.
    #[must_use]
    pub fn new(levels: [ExpressionLevel; MARKER_COUNT]) -> Self {
        Self { levels }
    }

    /// Reading for one marker.
    #[must_use]
    pub fn get(&self, marker: Marker) -> ExpressionLevel {
        self.levels[marker.index()]
    }

    /// Replace the reading for one marker.
    pub fn set(&mut self, marker: Marker, level: ExpressionLevel) {
        self.levels[marker.index()] = level;
    }

    /// `(marker, level)` pairs in training order.
    pub fn entries(&self) -> impl Iterator<Item = (Marker, ExpressionLevel)> + '_ {
        MARKERS.iter().map(|&m| (m, self.get(m)))
    }

    /// Encode into the classifier's feature vector.
    #[must_use]
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector(self.levels.map(ExpressionLevel::code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_order_is_training_order() {
        assert_eq!(
            column_names(),
            [
                "TFPI2 SET-1",
                "SEPTIN9 SET-1 R1",
                "SDC2 SET-3",
                "SFRP2 SET1 (40)",
                "HOXA2 SET1",
            ]
        );
        for (i, marker) in MARKERS.iter().enumerate() {
            assert_eq!(marker.index(), i);
        }
    }

    #[test]
    fn test_all_negative_encodes_to_zeros() {
        let panel = MarkerPanel::default();
        assert_eq!(panel.feature_vector(), FeatureVector([0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_feature_vector_follows_marker_order() {
        let mut panel = MarkerPanel::default();
        panel.set(Marker::Sdc2, ExpressionLevel::Positive3);
        panel.set(Marker::Hoxa2, ExpressionLevel::WeakPositive);

        assert_eq!(panel.feature_vector(), FeatureVector([0, 0, 5, 0, 1]));
    }

    #[test]
    fn test_feature_vector_decodes_back() {
        let panel = MarkerPanel::new([
            ExpressionLevel::Positive7,
            ExpressionLevel::Negative,
            ExpressionLevel::PositivePlus,
            ExpressionLevel::Positive2,
            ExpressionLevel::Positive6,
        ]);
        let decoded = panel.feature_vector().decode().expect("valid codes");
        assert_eq!(decoded, panel);
    }

    #[test]
    fn test_feature_vector_rejects_bad_code() {
        assert!(FeatureVector([0, 0, 12, 0, 0]).decode().is_err());
    }
}
