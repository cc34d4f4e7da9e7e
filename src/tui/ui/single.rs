//! Single-record entry: one closed-choice selector per marker.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::domain::{ExpressionLevel, Marker, MarkerPanel, Prediction, RiskLabel, MARKERS, MARKER_COUNT};
use crate::tui::styles::MedicalTheme;
use crate::tui::texts::Texts;

use super::key_hints;

/// Single-record tab state
#[derive(Debug, Default)]
pub struct SingleState {
    pub panel: MarkerPanel,
    pub selected: usize,
    pub result: Option<Prediction>,
    pub error_message: Option<String>,
}

impl SingleState {
    #[must_use]
    pub fn selected_marker(&self) -> Marker {
        MARKERS[self.selected]
    }

    /// Move to the next marker
    pub fn next_marker(&mut self) {
        self.selected = (self.selected + 1) % MARKER_COUNT;
    }

    /// Move to the previous marker
    pub fn prev_marker(&mut self) {
        self.selected = (self.selected + MARKER_COUNT - 1) % MARKER_COUNT;
    }

    /// Step the selected marker's reading up (wrapping).
    pub fn next_level(&mut self) {
        let marker = self.selected_marker();
        self.set_level(marker, self.panel.get(marker).next());
    }

    /// Step the selected marker's reading down (wrapping).
    pub fn prev_level(&mut self) {
        let marker = self.selected_marker();
        self.set_level(marker, self.panel.get(marker).prev());
    }

    // A shown result always matches the shown inputs.
    fn set_level(&mut self, marker: Marker, level: ExpressionLevel) {
        self.panel.set(marker, level);
        self.result = None;
        self.error_message = None;
    }
}

/// Render the single-record tab
pub fn render_single(f: &mut Frame, area: Rect, state: &SingleState, texts: &Texts) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Selectors + result
            Constraint::Length(2), // Footer/error
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[0]);

    render_selectors(f, columns[0], state, texts);
    render_result(f, columns[1], state.result.as_ref(), texts);
    render_footer(f, chunks[1], state, texts);
}

fn render_selectors(f: &mut Frame, area: Rect, state: &SingleState, texts: &Texts) {
    let block = Block::default()
        .title(Span::styled(format!(" {} ", texts.gen_expression), MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let constraints: Vec<Constraint> = MARKERS
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, (marker, level)) in state.panel.entries().enumerate() {
        let is_selected = i == state.selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let field = Paragraph::new(Line::from(vec![
            Span::styled(if is_selected { " ◀ " } else { "   " }, MedicalTheme::cursor()),
            Span::styled(level.label(), MedicalTheme::text()),
            Span::styled(if is_selected { " ▶" } else { "" }, MedicalTheme::cursor()),
        ]))
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} {} ", marker.column_name(), texts.expression_suffix),
                    title_style,
                ))
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(field, rows[i]);
    }
}

fn render_result(f: &mut Frame, area: Rect, result: Option<&Prediction>, texts: &Texts) {
    let Some(prediction) = result else {
        let idle = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(texts.no_result, MedicalTheme::text_muted())),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
        f.render_widget(idle, area);
        return;
    };

    let risk_style = MedicalTheme::risk_level(prediction.risk);
    let block = Block::default()
        .title(Span::styled(format!(" {} ", texts.predict), MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(risk_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Risk message
            Constraint::Min(0),    // Model input echo
        ])
        .margin(1)
        .split(inner);

    let (icon, message) = match prediction.risk {
        RiskLabel::Low => ("OK", texts.low_risk),
        RiskLabel::High => ("!", texts.high_risk),
    };
    let risk_display = Paragraph::new(Line::from(Span::styled(
        format!("{icon} {message}"),
        risk_style.add_modifier(Modifier::BOLD),
    )))
    .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(risk_display, chunks[0]);

    let rows = prediction.inputs.entries().map(|(marker, level)| {
        Row::new(vec![
            Cell::from(marker.column_name()).style(MedicalTheme::text_secondary()),
            Cell::from(level.label()).style(MedicalTheme::text()),
        ])
    });
    let echo = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)]).block(
        Block::default()
            .title(Span::styled(format!(" {} ", texts.model_input), MedicalTheme::text_secondary()))
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(echo, chunks[1]);
}

fn render_footer(f: &mut Frame, area: Rect, state: &SingleState, texts: &Texts) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        key_hints(&[
            ("↑↓", texts.key_select),
            ("←→", texts.key_change),
            ("Enter", texts.predict),
            ("F3", texts.key_language),
            ("Ctrl+Q", texts.key_quit),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
