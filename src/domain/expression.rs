//! Expression levels: the fixed categorical encoding shared by every workflow.
//!
//! Ten ordinal labels map one-to-one onto the integer codes 0-9 the classifier
//! was trained on. The table is explicit and closed; nothing is inferred from data.

use serde::{Deserialize, Serialize};

/// Error type for encoding and decoding expression levels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("Unknown expression label: {0:?}")]
    UnknownLabel(String),

    #[error("Unknown expression code: {0}")]
    UnknownCode(u8),
}

/// Ordinal intensity of a gene-expression reading.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ExpressionLevel {
    #[default]
    Negative,
    WeakPositive,
    Positive,
    PositivePlus,
    Positive2,
    Positive3,
    Positive4,
    Positive5,
    Positive6,
    Positive7,
}

impl ExpressionLevel {
    /// All levels in code order (index == code).
    pub const ALL: [ExpressionLevel; 10] = [
        Self::Negative,
        Self::WeakPositive,
        Self::Positive,
        Self::PositivePlus,
        Self::Positive2,
        Self::Positive3,
        Self::Positive4,
        Self::Positive5,
        Self::Positive6,
        Self::Positive7,
    ];

    /// Label as it appears in spreadsheets and selection widgets.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Negative => "Neg",
            Self::WeakPositive => "Zayıf Pos",
            Self::Positive => "Pos",
            Self::PositivePlus => "Pos +",
            Self::Positive2 => "Pos 2+",
            Self::Positive3 => "Pos 3+",
            Self::Positive4 => "Pos 4+",
            Self::Positive5 => "Pos 5+",
            Self::Positive6 => "Pos 6+",
            Self::Positive7 => "Pos 7+",
        }
    }

    /// Integer code fed to the classifier.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a level by its exact label.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownLabel` for anything outside the ten labels.
    pub fn from_label(label: &str) -> Result<Self, EncodingError> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.label() == label)
            .ok_or_else(|| EncodingError::UnknownLabel(label.to_string()))
    }

    /// Look up a level by its code.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCode` for codes above 9.
    pub fn from_code(code: u8) -> Result<Self, EncodingError> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(EncodingError::UnknownCode(code))
    }

    /// Next level, wrapping from the strongest back to `Neg`.
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(usize::from(self.code()) + 1) % Self::ALL.len()]
    }

    /// Previous level, wrapping from `Neg` to the strongest.
    #[must_use]
    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(usize::from(self.code()) + len - 1) % len]
    }
}

impl std::fmt::Display for ExpressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExpressionLevel {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

/// Encode a label into its integer code.
///
/// # Errors
/// Returns `EncodingError::UnknownLabel` if the label is not one of the ten.
pub fn encode(label: &str) -> Result<u8, EncodingError> {
    ExpressionLevel::from_label(label).map(ExpressionLevel::code)
}

/// Decode an integer code into its label.
///
/// # Errors
/// Returns `EncodingError::UnknownCode` if the code is outside 0-9.
pub fn decode(code: u8) -> Result<&'static str, EncodingError> {
    ExpressionLevel::from_code(code).map(ExpressionLevel::label)
}

/// Labels in code order, for building selection widgets.
#[must_use]
pub fn labels() -> [&'static str; 10] {
    ExpressionLevel::ALL.map(ExpressionLevel::label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for label in labels() {
            let code = encode(label).expect("known label");
            assert_eq!(decode(code).expect("known code"), label);
        }
    }

    #[test]
    fn test_code_roundtrip() {
        for code in 0..10u8 {
            let label = decode(code).expect("known code");
            assert_eq!(encode(label).expect("known label"), code);
        }
    }

    #[test]
    fn test_codes_follow_table_order() {
        assert_eq!(encode("Neg"), Ok(0));
        assert_eq!(encode("Zayıf Pos"), Ok(1));
        assert_eq!(encode("Pos +"), Ok(3));
        assert_eq!(encode("Pos 3+"), Ok(5));
        assert_eq!(encode("Pos 7+"), Ok(9));
    }

    #[test]
    fn test_unknown_label_is_error() {
        assert_eq!(
            encode("Pos 8+"),
            Err(EncodingError::UnknownLabel("Pos 8+".to_string()))
        );
        // Lookup is exact: case and inner spacing matter.
        assert!(encode("neg").is_err());
        assert!(encode("Pos  3+").is_err());
        assert!(encode("").is_err());
    }

    #[test]
    fn test_unknown_code_is_error() {
        assert_eq!(decode(10), Err(EncodingError::UnknownCode(10)));
        assert!(ExpressionLevel::from_code(u8::MAX).is_err());
    }

    #[test]
    fn test_cycling_wraps() {
        assert_eq!(ExpressionLevel::Positive7.next(), ExpressionLevel::Negative);
        assert_eq!(ExpressionLevel::Negative.prev(), ExpressionLevel::Positive7);
        assert_eq!(ExpressionLevel::Positive.next(), ExpressionLevel::PositivePlus);
    }
}
