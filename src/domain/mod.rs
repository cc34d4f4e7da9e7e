//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O: the expression encoding table, the fixed
//! marker order, prediction records and the batch table.

mod batch;
pub mod expression;
mod marker;
mod prediction;

pub use batch::BatchTable;
pub use expression::{EncodingError, ExpressionLevel};
pub use marker::{column_names, FeatureVector, Marker, MarkerPanel, MARKERS, MARKER_COUNT};
pub use prediction::{InvalidClass, Prediction, RiskLabel, PREDICTION_COLUMN};
