//! Runtime configuration from environment variables.
//!
//! There is no config file; every setting has a default that works from a
//! source checkout.

use std::path::PathBuf;

use crate::tui::Language;

const MODEL_PATH_ENV: &str = "COLORISK_MODEL_PATH";
const OUTPUT_DIR_ENV: &str = "COLORISK_OUTPUT_DIR";
const LANGUAGE_ENV: &str = "COLORISK_LANGUAGE";
const LOG_MODE_ENV: &str = "COLORISK_LOG_MODE";
const LOG_FILE_ENV: &str = "COLORISK_LOG_FILE";

/// Where log output goes.
///
/// Writing logs to the terminal would corrupt the TUI's alternate screen,
/// so `Auto` picks a file when stdout is interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    File,
    Stdout,
    #[default]
    Auto,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is a terminal.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Classifier directory, or the `classifier.json` file itself
    pub model_path: PathBuf,
    /// Directory that receives downloaded workbooks
    pub output_dir: PathBuf,
    /// Initial UI language
    pub language: Language,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            output_dir: PathBuf::from("."),
            language: Language::Turkish,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("colorisk.log"),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset
    /// or blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            model_path: get(MODEL_PATH_ENV).map_or(defaults.model_path, PathBuf::from),
            output_dir: get(OUTPUT_DIR_ENV).map_or(defaults.output_dir, PathBuf::from),
            language: get(LANGUAGE_ENV)
                .and_then(|v| Language::from_code(&v))
                .unwrap_or(defaults.language),
            log_mode: get(LOG_MODE_ENV).map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: get(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from),
        }
    }
}
