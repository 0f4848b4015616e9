use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::AppState,
    ui::{
        components::{
            card::{Card, StatCard},
            charts::ascii_bar,
        },
        screens::render_empty,
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let Some(summary) = state.analytics.summary.as_ref() else {
        let message = state
            .analytics
            .error
            .as_deref()
            .map_or("Loading analytics…".to_string(), |err| {
                format!("Analytics unavailable: {err}")
            });
        render_empty(frame, area, "Analytics", &message, &theme);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);

    StatCard::new("Trips", summary.total_trips.to_string(), &theme)
        .subtitle(format!(
            "{} upcoming, {} done",
            summary.upcoming_trips, summary.completed_trips
        ))
        .render(frame, cards[0]);
    StatCard::new("Countries", summary.countries_visited.to_string(), &theme)
        .render(frame, cards[1]);
    StatCard::new("Total budget", format!("{:.0}", summary.total_budget), &theme)
        .render(frame, cards[2]);
    StatCard::new(
        "Average length",
        summary
            .average_trip_days
            .map_or_else(|| "-".to_string(), |days| format!("{days:.1} days")),
        &theme,
    )
    .render(frame, cards[3]);

    let max = summary
        .top_destinations
        .iter()
        .map(|d| d.trips)
        .max()
        .unwrap_or(0);
    let lines = if summary.top_destinations.is_empty() {
        vec![Line::from(Span::styled(
            "No destinations yet.",
            Style::default().fg(theme.dim),
        ))]
    } else {
        summary
            .top_destinations
            .iter()
            .map(|destination| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<20}", destination.country),
                        Style::default().fg(theme.text),
                    ),
                    Span::styled(
                        ascii_bar(f64::from(destination.trips), f64::from(max), 24),
                        Style::default().fg(theme.accent),
                    ),
                    Span::styled(
                        format!(" {}", destination.trips),
                        Style::default().fg(theme.dim),
                    ),
                ])
            })
            .collect()
    };
    Card::new("Top destinations", &theme).render_with(frame, rows[1], Paragraph::new(lines));
}
