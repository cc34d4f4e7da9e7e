//! Main TUI application state machine.
//!
//! Handles:
//! - Tab navigation and the language toggle
//! - Input event handling
//! - Service integration (prediction, batch upload, downloads)

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use zeroize::Zeroizing;

use crate::adapters::model::{self, JsonClassifier, ModelLoader};
use crate::adapters::xlsx::XlsxCodec;
use crate::application::batch::{RESULTS_FILE_STEM, TEMPLATE_FILE_STEM};
use crate::application::{BatchError, BatchService, PredictionService};
use crate::config::AppConfig;
use crate::ports::Classifier;

use super::texts::Language;
use super::ui::{
    batch::{render_batch, BatchState},
    render_disclaimer, render_header,
    single::{render_single, SingleState},
};

/// Current tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Single,
    Batch,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Self::Single => 0,
            Self::Batch => 1,
        }
    }
}

/// Main application state
pub struct App<C: Classifier = JsonClassifier> {
    /// Current tab
    tab: Tab,

    /// Active UI language
    language: Language,

    /// Whether the app should quit
    should_quit: bool,

    /// Where downloads are written
    output_dir: PathBuf,

    /// Single-record workflow
    predictions: PredictionService<C>,

    /// Spreadsheet workflow
    batch: BatchService<C, XlsxCodec>,

    /// Model description for the title bar
    model_description: String,

    single_state: SingleState,
    batch_state: BatchState,
}

impl App {
    /// Create the application, loading the classifier from the configured path.
    ///
    /// # Errors
    /// Returns error if the model is missing, unsigned where a signature is
    /// required, or malformed. The session cannot start without it.
    pub fn new(config: AppConfig) -> Result<Self> {
        let model_path = config.model_path.clone();
        if !model_path.exists() {
            return Err(anyhow!(
                "Model path not found at {:?}. Set COLORISK_MODEL_PATH to a directory containing {}.",
                model_path,
                model::MODEL_FILE
            ));
        }

        let loader = ModelLoader::from_env()?;
        let classifier = model::load_shared(&loader, &model_path)
            .map_err(|e| anyhow!("Failed to load model from {:?}: {}", model_path, e))?;

        Ok(Self::with_dependencies(config, classifier))
    }
}

impl<C: Classifier> App<C> {
    /// Create application with an injected classifier (Composition Root pattern).
    pub fn with_dependencies(config: AppConfig, classifier: Arc<C>) -> Self {
        let predictions = PredictionService::new(classifier);
        let batch = BatchService::new(predictions.clone(), XlsxCodec::new());
        let model_description = predictions.classifier_description();

        Self {
            tab: Tab::Single,
            language: config.language,
            should_quit: false,
            output_dir: config.output_dir,
            predictions,
            batch,
            model_description,
            single_state: SingleState::default(),
            batch_state: BatchState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let texts = self.language.texts();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(4),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                render_header(
                    f,
                    chunks[0],
                    self.tab.index(),
                    self.language,
                    &self.model_description,
                );

                match self.tab {
                    Tab::Single => render_single(f, chunks[1], &self.single_state, texts),
                    Tab::Batch => render_batch(f, chunks[1], &self.batch_state, texts),
                }

                render_disclaimer(f, chunks[2], texts);
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        // Global keys
        match key {
            KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.tab = Tab::Single;
                return;
            }
            KeyCode::F(2) => {
                self.tab = Tab::Batch;
                return;
            }
            KeyCode::F(3) => {
                self.language = self.language.toggle();
                tracing::debug!("UI language set to {}", self.language.name());
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Single => self.handle_single_key(key),
            Tab::Batch => self.handle_batch_key(key, ctrl),
        }
    }

    fn handle_single_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up => self.single_state.prev_marker(),
            KeyCode::Down | KeyCode::Tab => self.single_state.next_marker(),
            KeyCode::Right => self.single_state.next_level(),
            KeyCode::Left => self.single_state.prev_level(),
            KeyCode::Enter => self.submit_single(),
            _ => {}
        }
    }

    fn handle_batch_key(&mut self, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Char('s') if ctrl => self.save_results(),
            KeyCode::Char('t') if ctrl => self.save_template(),
            KeyCode::Char(c) if !ctrl => self.batch_state.input_char(c),
            KeyCode::Backspace => self.batch_state.delete_char(),
            KeyCode::Esc => self.batch_state.clear_input(),
            KeyCode::Up => self.batch_state.scroll_up(),
            KeyCode::Down => self.batch_state.scroll_down(),
            KeyCode::Enter => self.process_upload(),
            _ => {}
        }
    }

    fn submit_single(&mut self) {
        match self.predictions.predict_single(&self.single_state.panel) {
            Ok(prediction) => {
                self.single_state.result = Some(prediction);
                self.single_state.error_message = None;
            }
            Err(e) => {
                tracing::error!("Single prediction failed: {}", e);
                self.single_state.result = None;
                self.single_state.error_message = Some(e.to_string());
            }
        }
    }

    fn process_upload(&mut self) {
        let texts = self.language.texts();
        let path = PathBuf::from(self.batch_state.upload_path());
        if path.as_os_str().is_empty() {
            return;
        }

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => {
                tracing::warn!("Cannot read upload: {}", e);
                self.batch_state
                    .set_error(format!("{}: {} ({})", texts.processing_error, e, path.display()));
                return;
            }
        };

        match self.batch.process_upload(&bytes) {
            Ok(outcome) => {
                let message = format!("{} ({} {})", texts.predictions_ready, outcome.table.len(), texts.rows);
                self.batch_state.set_outcome(outcome, message);
            }
            Err(BatchError::MissingColumn(column)) => {
                tracing::warn!("Upload rejected: missing column '{}'", column);
                self.batch_state.set_error(self.language.missing_column(&column));
            }
            Err(e) => {
                tracing::warn!("Upload rejected: {}", e);
                self.batch_state
                    .set_error(format!("{}: {}", texts.processing_error, e));
            }
        }
    }

    fn save_results(&mut self) {
        let texts = self.language.texts();
        let Some(outcome) = &self.batch_state.outcome else {
            self.batch_state.set_error(texts.nothing_to_save.to_string());
            return;
        };

        let written = self
            .batch
            .export_results(outcome)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.write_download(RESULTS_FILE_STEM, &bytes));
        self.report_download(written);
    }

    fn save_template(&mut self) {
        let written = self
            .batch
            .export_template()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.write_download(TEMPLATE_FILE_STEM, &bytes));
        self.report_download(written);
    }

    fn write_download(&self, stem: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{stem}.{}", self.batch.extension()));
        std::fs::write(&path, bytes)?;
        tracing::info!(size_bytes = bytes.len(), "Wrote {}", path.display());
        Ok(path)
    }

    fn report_download(&mut self, written: Result<PathBuf>) {
        let texts = self.language.texts();
        match written {
            Ok(path) => {
                let message = format!("{}: {}", texts.saved_to, display_path(&path));
                // Keep the table on screen; only the banner changes.
                self.batch_state.banner = Some(super::ui::batch::Banner::Success(message));
            }
            Err(e) => {
                tracing::error!("Download failed: {}", e);
                self.batch_state.banner = Some(super::ui::batch::Banner::Error(e.to_string()));
            }
        }
    }
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
