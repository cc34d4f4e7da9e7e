//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement the two
//! workflows: a single marker panel, and a whole spreadsheet.

pub mod batch;
mod prediction;

pub use batch::{BatchError, BatchOutcome, BatchService, InvalidCell};
pub use prediction::{PredictionError, PredictionService};
