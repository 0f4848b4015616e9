pub mod analytics;
pub mod login;
pub mod reports;
pub mod settings;
pub mod trip;
pub mod trips;
pub mod versions;
pub mod wizard;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ui::{components::card::Card, theme::Theme};

/// A titled card with a single centered message.
pub(crate) fn render_empty(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    message: &str,
    theme: &Theme,
) {
    let text = Paragraph::new(Line::styled(
        message.to_string(),
        Style::default().fg(theme.dim),
    ))
    .alignment(Alignment::Center);
    Card::new(title, theme).render_with(frame, area, text);
}

/// `Label: value` row of a form, with a cursor on the focused field.
pub(crate) fn form_line(label: &str, value: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.dim)
    };
    let cursor = if focused { "│" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:<20}"), label_style),
        Span::styled(format!("{value}{cursor}"), Style::default().fg(theme.text)),
    ])
}
