//! UI module: View components for the TUI.

pub mod batch;
pub mod single;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;
use crate::tui::texts::{Language, Texts};

/// Build a footer line from `(key, description)` pairs.
pub fn key_hints<'a>(hints: &[(&'a str, &'a str)]) -> Line<'a> {
    let spans: Vec<Span<'a>> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Title bar with the tab strip and the active language.
pub fn render_header(f: &mut Frame, area: Rect, selected_tab: usize, language: Language, model: &str) {
    let texts = language.texts();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(2)])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", texts.title), MedicalTheme::header()),
        Span::styled(format!(" {} ", language.name()), MedicalTheme::focused()),
        Span::styled(format!("│ {model}"), MedicalTheme::text_muted()),
    ]));
    f.render_widget(title, rows[0]);

    let description = Paragraph::new(Span::styled(texts.description, MedicalTheme::text_secondary()));
    f.render_widget(description, rows[1]);

    let tabs = Tabs::new(vec![
        format!("F1 {}", texts.tab_single),
        format!("F2 {}", texts.tab_bulk),
    ])
    .select(selected_tab)
    .style(MedicalTheme::text_secondary())
    .highlight_style(MedicalTheme::selected())
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(tabs, rows[2]);
}

/// Privacy warning and educational-use note, shown on every tab.
pub fn render_disclaimer(f: &mut Frame, area: Rect, texts: &Texts) {
    let text = vec![
        Line::from(vec![Span::styled(texts.privacy_warning, MedicalTheme::warning())]),
        Line::from(vec![Span::styled(texts.note, MedicalTheme::text_muted())]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
