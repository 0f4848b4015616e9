pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use serde_json::Value;

use crate::app::{AppState, ReportTab, Screen, Section, TripMode, TripsMode};
use components::hints::{self, KeyHint, hint_separator, hints_to_spans};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, state),
        Screen::Main => render_shell(frame, area, state),
    }
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(
        frame,
        layout[1],
        state.section,
        state.trip.flow.is_some(),
        &theme,
    );

    let content = layout[2];
    match state.section {
        Section::Trips => screens::trips::render(frame, content, state),
        Section::Trip => screens::trip::render(frame, content, state),
        Section::Versions => screens::versions::render(frame, content, state),
        Section::Reports => screens::reports::render(frame, content, state),
        Section::Analytics => screens::analytics::render(frame, content, state),
        Section::Settings => screens::settings::render(frame, content, state),
    }

    render_bottom_bar(frame, layout[3], state, &theme);
    if state.section == Section::Trip
        && let Some(flow) = state.trip.flow.as_ref()
        && state.trip.dialog_open()
    {
        components::dialog::render(frame, content, flow, &theme);
    }
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let user = state.user_email.as_deref().unwrap_or("-");
    let trip = state
        .trip
        .flow
        .as_ref()
        .map(|flow| {
            let trip = flow.trip();
            let title = trip.title.as_deref().unwrap_or("Untitled");
            match flow.version() {
                Some(version) => format!("{title} v{version}"),
                None => title.to_string(),
            }
        })
        .unwrap_or_else(|| "-".to_string());
    let now = Utc::now().with_timezone(&state.timezone).format("%H:%M");

    let mut spans = vec![
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {user}  ")),
        Span::styled("Trip", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {trip}  ")),
        Span::styled("Time", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {now} {}  ", state.timezone.name())),
    ];
    if let Some(progress) = state.trip.flow.as_ref().and_then(|flow| flow.progress())
        && progress.status.is_active()
    {
        spans.push(Span::styled(
            format!("Recalculating {:.0}%", progress.progress),
            Style::default().fg(theme.accent),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::tabs::tab_shortcuts(theme);

    let context = context_hints(state);
    if !context.is_empty() {
        parts.push(hint_separator(theme));
        parts.extend(hints_to_spans(context, theme));
    }

    parts.push(hint_separator(theme));
    let quit = if state.is_typing() { "Ctrl+C" } else { "q" };
    parts.push(Span::styled(quit, Style::default().fg(theme.accent)));
    parts.push(Span::raw(" quit"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn context_hints(state: &AppState) -> &'static [KeyHint] {
    match state.section {
        Section::Trips => match state.trips.mode {
            TripsMode::List => const { &[
                KeyHint::new("↑↓", "select"),
                KeyHint::new("Enter", "open"),
                KeyHint::new("n", "new"),
                KeyHint::new("d", "delete"),
                KeyHint::new("r", "refresh"),
                KeyHint::new("x", "sign out"),
            ] },
            TripsMode::ConfirmDelete => hints::CONFIRM,
            TripsMode::Wizard => const { &[
                KeyHint::new("Tab", "next field"),
                KeyHint::new("Enter", "continue"),
                KeyHint::new("Esc", "back"),
            ] },
        },
        Section::Trip if state.trip.dialog_open() => const { &[
            KeyHint::new("Enter", "save"),
            KeyHint::new("space", "recalc"),
            KeyHint::new("Esc", "back"),
        ] },
        Section::Trip => match state.trip.mode {
            TripMode::Overview => const { &[
                KeyHint::new("e", "edit"),
                KeyHint::new("i", "cover image"),
                KeyHint::new("c", "cancel recalc"),
                KeyHint::new("r", "full recalc"),
                KeyHint::new("l", "reload"),
            ] },
            TripMode::Edit => const { &[
                KeyHint::new("Tab", "next"),
                KeyHint::new("Enter", "preview"),
                KeyHint::new("Esc", "cancel"),
            ] },
            TripMode::Cover => const { &[KeyHint::new("Enter", "upload"), KeyHint::new("Esc", "cancel")] },
        },
        Section::Versions if state.versions.confirm_restore.is_some() => hints::CONFIRM,
        Section::Versions => const { &[
            KeyHint::new("↑↓", "select"),
            KeyHint::new("space", "mark"),
            KeyHint::new("c", "clear marks"),
            KeyHint::new("Enter", "restore"),
        ] },
        Section::Reports => const { &[KeyHint::new("←→", "report"), KeyHint::new("r", "reload")] },
        Section::Analytics => const { &[KeyHint::new("r", "refresh")] },
        Section::Settings if state.settings.editing => hints::FORM_EDITING,
        Section::Settings => const { &[KeyHint::new("e", "edit"), KeyHint::new("r", "reload")] },
    }
}

/// Formats an instant in the display timezone.
pub fn local_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Display form of a trip field value from a diff.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "(empty)".to_string(),
        Value::String(text) if text.is_empty() => "(empty)".to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.is_empty() => "(empty)".to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub fn report_tab_label(tab: ReportTab, active: ReportTab, theme: &Theme) -> Span<'static> {
    if tab == active {
        Span::styled(format!("[{}]", tab.label()), Style::default().fg(theme.accent))
    } else {
        Span::styled(tab.label().to_string(), Style::default().fg(theme.text_muted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_render_without_json_quoting() {
        assert_eq!(format_value(&json!("Kyoto")), "Kyoto");
        assert_eq!(format_value(&json!(null)), "(empty)");
        assert_eq!(format_value(&json!("")), "(empty)");
        assert_eq!(format_value(&json!(["food", "art"])), "food, art");
        assert_eq!(format_value(&json!(2500.5)), "2500.5");
    }

    #[test]
    fn times_follow_the_display_timezone() {
        let at = "2026-03-01T12:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(local_time(at, Tz::UTC), "2026-03-01 12:30");
        assert_eq!(local_time(at, Tz::Asia__Tokyo), "2026-03-01 21:30");
    }
}
