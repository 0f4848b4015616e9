use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::AppState,
    forms::{SettingsField, SettingsForm},
    ui::{
        components::card::Card,
        screens::{form_line, render_empty},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let settings = &state.settings;
    let Some(value) = settings.value.as_ref() else {
        let message = settings
            .error
            .as_deref()
            .map_or("Loading settings…".to_string(), |err| {
                format!("Settings unavailable: {err}")
            });
        render_empty(frame, area, "Settings", &message, &theme);
        return;
    };

    let shown;
    let form = if settings.editing {
        &settings.form
    } else {
        shown = SettingsForm::from_settings(value.get());
        &shown
    };

    let mut lines = SettingsField::ALL
        .iter()
        .map(|field| {
            let focused = settings.editing && form.focused() == *field;
            form_line(field.label(), form.value(*field), focused, &theme)
        })
        .collect::<Vec<_>>();

    lines.push(Line::raw(""));
    if settings.editing {
        lines.push(Line::from(Span::styled(
            "Any key flips an on/off field",
            Style::default().fg(theme.dim),
        )));
    }
    if value.is_pending() {
        lines.push(Line::from(Span::styled(
            "Saving…",
            Style::default().fg(theme.text_muted),
        )));
    }
    if let Some(err) = settings.error.as_deref() {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    Card::new("Settings", &theme)
        .focused(settings.editing)
        .render_with(frame, area, Paragraph::new(lines));
}
