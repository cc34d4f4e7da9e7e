//! # Colorisk
//!
//! Colon-cancer risk screening from five gene-expression markers.
//!
//! This crate provides:
//! - The ordinal encoding of expression readings (`Neg` … `Pos 7+`)
//! - Single-record and spreadsheet batch prediction against a signed,
//!   pre-trained classifier
//! - Terminal UI in Turkish and English
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (expression levels, marker panel, batch table)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (JSON model, xlsx, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{ExpressionLevel, Marker, MarkerPanel, Prediction, RiskLabel};

/// Result type for Colorisk operations
pub type Result<T> = std::result::Result<T, ColoriskError>;

/// Main error type for Colorisk
#[derive(Debug, thiserror::Error)]
pub enum ColoriskError {
    #[error("Invalid expression reading: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Classifier failed: {0}")]
    Classifier(#[from] ports::ClassifierError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] ports::SpreadsheetError),

    #[error("Model not loaded: {0}")]
    Model(#[from] adapters::ModelError),

    #[error("Batch rejected: {0}")]
    Batch(#[from] application::BatchError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] application::PredictionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
