//! Batch tab: upload path, required columns, and the predicted table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::application::BatchOutcome;
use crate::domain::{column_names, RiskLabel, PREDICTION_COLUMN};
use crate::tui::styles::MedicalTheme;
use crate::tui::texts::Texts;

use super::key_hints;

/// Banner shown above the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

/// Batch tab state
#[derive(Debug, Default)]
pub struct BatchState {
    pub path_input: String,
    pub outcome: Option<BatchOutcome>,
    pub banner: Option<Banner>,
    pub scroll: usize,
}

impl BatchState {
    /// Add a character to the path
    pub fn input_char(&mut self, c: char) {
        self.path_input.push(c);
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.path_input.pop();
    }

    pub fn clear_input(&mut self) {
        self.path_input.clear();
        self.banner = None;
    }

    pub fn scroll_down(&mut self) {
        let rows = self.outcome.as_ref().map_or(0, |o| o.table.len());
        if self.scroll + 1 < rows {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Path as typed, without surrounding whitespace or quotes.
    #[must_use]
    pub fn upload_path(&self) -> &str {
        self.path_input.trim().trim_matches(|c| c == '"' || c == '\'')
    }

    pub fn set_outcome(&mut self, outcome: BatchOutcome, message: String) {
        self.outcome = Some(outcome);
        self.scroll = 0;
        self.banner = Some(Banner::Success(message));
    }

    /// Report a failure. The previous table is dropped so it cannot be
    /// mistaken for the result of the failed upload.
    pub fn set_error(&mut self, message: String) {
        self.outcome = None;
        self.scroll = 0;
        self.banner = Some(Banner::Error(message));
    }
}

/// Render the batch tab
pub fn render_batch(f: &mut Frame, area: Rect, state: &BatchState, texts: &Texts) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Required columns
            Constraint::Length(3), // Path input
            Constraint::Length(2), // Banner
            Constraint::Min(0),    // Result table
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_required_columns(f, chunks[0], texts);
    render_path_input(f, chunks[1], state, texts);
    render_banner(f, chunks[2], state.banner.as_ref());
    render_table(f, chunks[3], state, texts);
    render_footer(f, chunks[4], texts);
}

fn render_required_columns(f: &mut Frame, area: Rect, texts: &Texts) {
    let hint = Paragraph::new(vec![
        Line::from(Span::styled(texts.required_columns, MedicalTheme::text_secondary())),
        Line::from(Span::styled(column_names().join(", "), MedicalTheme::focused())),
    ])
    .block(
        Block::default()
            .title(Span::styled(format!(" {} ", texts.bulk_upload), MedicalTheme::subtitle()))
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(hint, area);
}

fn render_path_input(f: &mut Frame, area: Rect, state: &BatchState, texts: &Texts) {
    let value = if state.path_input.is_empty() {
        Span::styled(texts.upload_hint, MedicalTheme::text_muted())
    } else {
        Span::styled(state.path_input.as_str(), MedicalTheme::text())
    };

    let input = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        value,
        Span::styled("▌", MedicalTheme::cursor()),
    ]))
    .block(
        Block::default()
            .title(Span::styled(format!(" {} ", texts.upload_path), MedicalTheme::focused()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );
    f.render_widget(input, area);
}

fn render_banner(f: &mut Frame, area: Rect, banner: Option<&Banner>) {
    let line = match banner {
        Some(Banner::Success(msg)) => Line::from(vec![
            Span::styled("OK ", MedicalTheme::success()),
            Span::styled(msg.as_str(), MedicalTheme::success()),
        ]),
        Some(Banner::Error(msg)) => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(msg.as_str(), MedicalTheme::danger()),
        ]),
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn render_table(f: &mut Frame, area: Rect, state: &BatchState, texts: &Texts) {
    let Some(outcome) = &state.outcome else {
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
            area,
        );
        return;
    };

    let table = &outcome.table;
    let prediction_col = table.column_index(PREDICTION_COLUMN);

    let header = Row::new(
        table
            .headers()
            .iter()
            .map(|h| Cell::from(h.as_str()).style(MedicalTheme::title())),
    );

    let rows = table
        .rows()
        .iter()
        .zip(&outcome.risks)
        .skip(state.scroll)
        .map(|(row, risk)| {
            Row::new(row.iter().enumerate().map(|(col, value)| {
                let style = if Some(col) == prediction_col {
                    MedicalTheme::risk_level(*risk)
                } else {
                    MedicalTheme::text()
                };
                Cell::from(value.as_str()).style(style)
            }))
        });

    let widths: Vec<Constraint> = table
        .headers()
        .iter()
        .map(|h| Constraint::Min(u16::try_from(h.chars().count()).unwrap_or(u16::MAX).max(6)))
        .collect();

    let title = format!(
        " {} {} │ {} {} ",
        table.len(),
        texts.rows,
        outcome.high_risk_count(),
        RiskLabel::High
    );

    let widget = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(Span::styled(title, MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(widget, area);
}

fn render_footer(f: &mut Frame, area: Rect, texts: &Texts) {
    let footer = Paragraph::new(key_hints(&[
        ("Enter", texts.key_process),
        ("↑↓", texts.key_scroll),
        ("Ctrl+S", texts.download_excel),
        ("Ctrl+T", texts.csv_example),
        ("F3", texts.key_language),
        ("Ctrl+Q", texts.key_quit),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatchTable;

    fn outcome(rows: usize) -> BatchOutcome {
        BatchOutcome {
            table: BatchTable::new(vec!["a".to_string()], vec![vec!["x".to_string()]; rows]),
            risks: vec![RiskLabel::Low; rows],
        }
    }

    #[test]
    fn test_upload_path_strips_quotes() {
        let state = BatchState {
            path_input: "  '/tmp/my file.xlsx' ".to_string(),
            ..BatchState::default()
        };
        assert_eq!(state.upload_path(), "/tmp/my file.xlsx");
    }

    #[test]
    fn test_scroll_stays_inside_table() {
        let mut state = BatchState::default();
        state.set_outcome(outcome(2), "ok".to_string());
        state.scroll_down();
        state.scroll_down();
        assert_eq!(state.scroll, 1);
        state.scroll_up();
        state.scroll_up();
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn test_error_drops_previous_table() {
        let mut state = BatchState::default();
        state.set_outcome(outcome(3), "ok".to_string());
        state.set_error("bad".to_string());
        assert!(state.outcome.is_none());
        assert_eq!(state.banner, Some(Banner::Error("bad".to_string())));
    }
}
