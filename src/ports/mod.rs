//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the trained model and
//! the spreadsheet format).

mod classifier;
mod spreadsheet;

pub use classifier::{Classifier, ClassifierError};
pub use spreadsheet::{SpreadsheetCodec, SpreadsheetError};
