use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use api_types::trip::Trip;
use planner::EditFlow;

use crate::{
    app::{AppState, TripMode},
    forms::{TripField, TripForm},
    ui::{
        components::{card::Card, progress},
        local_time,
        screens::{form_line, render_empty},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let Some(flow) = state.trip.flow.as_ref() else {
        render_empty(frame, area, "Trip", "Open a trip from the dashboard.", &theme);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    match state.trip.mode {
        TripMode::Edit => render_form(frame, columns[0], state, &theme),
        TripMode::Overview | TripMode::Cover => {
            render_details(frame, columns[0], flow.trip(), &theme);
        }
    }
    render_side(frame, columns[1], state, flow, &theme);
}

fn render_details(frame: &mut Frame<'_>, area: Rect, trip: &Trip, theme: &Theme) {
    let form = TripForm::from_trip(trip);
    let mut lines = TripField::ALL
        .iter()
        .map(|field| {
            let value = form.value(*field);
            Line::from(vec![
                Span::styled(format!("{:<20}", field.label()), Style::default().fg(theme.dim)),
                Span::styled(
                    if value.is_empty() { "-" } else { value }.to_string(),
                    Style::default().fg(theme.text),
                ),
            ])
        })
        .collect::<Vec<_>>();
    if let Some(status) = &trip.status {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20}", "Status"), Style::default().fg(theme.dim)),
            Span::styled(status.clone(), Style::default().fg(theme.accent)),
        ]));
    }

    let title = trip.title.as_deref().unwrap_or("Trip");
    Card::new(title, theme)
        .badge(format!("v{}", trip.version), theme.text_muted)
        .render_with(frame, area, Paragraph::new(lines).wrap(Wrap { trim: false }));
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.trip.form;
    let mut lines = TripField::ALL
        .iter()
        .map(|field| {
            form_line(
                &field.label(),
                form.value(*field),
                form.focused() == *field,
                theme,
            )
        })
        .collect::<Vec<_>>();
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Dates as YYYY-MM-DD, interests comma separated",
        Style::default().fg(theme.dim),
    )));
    if let Some(err) = state.trip.error.as_deref() {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    Card::new("Edit trip", theme)
        .focused(true)
        .render_with(frame, area, Paragraph::new(lines));
}

fn render_side(frame: &mut Frame<'_>, area: Rect, state: &AppState, flow: &EditFlow, theme: &Theme) {
    let show_progress = flow.tracker().is_some();
    let show_cover_prompt = state.trip.mode == TripMode::Cover;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_cover_prompt { 4 } else { 0 }),
            Constraint::Length(if show_progress { progress::HEIGHT } else { 0 }),
            Constraint::Min(0),
        ])
        .split(area);

    if show_cover_prompt {
        let line = form_line("Image file", &state.trip.cover_path, true, theme);
        Card::new("Upload cover image", theme)
            .focused(true)
            .render_with(frame, layout[0], Paragraph::new(line));
    }
    if let Some(tracker) = flow.tracker() {
        progress::render(frame, layout[1], tracker, state.timezone, theme);
    }

    let trip = flow.trip();
    let mut lines = vec![Line::from(vec![
        Span::styled("Version ", Style::default().fg(theme.dim)),
        Span::styled(
            flow.version().map_or_else(|| "-".to_string(), |v| v.to_string()),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(updated) = trip.updated_at {
        lines.push(Line::from(Span::styled(
            format!("Updated {}", local_time(updated, state.timezone)),
            Style::default().fg(theme.dim),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("Cover ", Style::default().fg(theme.dim)),
        Span::styled(
            trip.cover_image_url.clone().unwrap_or_else(|| "none".to_string()),
            Style::default().fg(theme.text_muted),
        ),
    ]));
    if let Some(page) = &state.trip.page {
        let count = page.history.versions.len();
        lines.push(Line::from(Span::styled(
            format!("{count} versions in history"),
            Style::default().fg(theme.dim),
        )));
        if let Some(err) = &page.history_error {
            lines.push(Line::from(Span::styled(
                format!("History unavailable: {err}"),
                Style::default().fg(theme.error),
            )));
        }
    }
    if !state.trip.dialog_open()
        && let Some(err) = flow.error()
    {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    Card::new("Status", theme).render_with(
        frame,
        layout[2],
        Paragraph::new(lines).wrap(Wrap { trim: true }),
    );
}
