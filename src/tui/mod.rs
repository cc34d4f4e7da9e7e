//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two tabs:
//! - Single prediction from five closed-choice selectors
//! - Bulk prediction from an Excel workbook, with downloads
//!
//! All user-facing strings come from the per-language tables in `texts`.

mod app;
mod styles;
mod texts;
mod ui;

pub use app::{App, Tab};
pub use styles::MedicalTheme;
pub use texts::{Language, Texts};
