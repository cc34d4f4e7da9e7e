//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `model`: JSON classifier loading with signed-manifest verification
//! - `xlsx`: calamine / rust_xlsxwriter for Excel workbooks
//! - `sanitize`: health-data filtering for logs

pub mod model;
pub mod sanitize;
pub mod xlsx;

pub use model::ModelError;
