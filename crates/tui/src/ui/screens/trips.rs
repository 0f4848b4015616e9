use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use api_types::trip::TripSummary;

use crate::{
    app::{AppState, TripsMode},
    ui::{
        components::card::Card,
        screens::{render_empty, wizard},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    if state.trips.mode == TripsMode::Wizard
        && let Some(wizard) = state.trips.wizard.as_ref()
    {
        wizard::render(frame, area, wizard, &theme);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], state, &theme);
    render_list(frame, layout[1], state, &theme);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let trips = &state.trips;
    let line = if trips.mode == TripsMode::ConfirmDelete {
        let title = trips
            .selected_trip()
            .and_then(|trip| trip.title.as_deref())
            .unwrap_or("this trip");
        Line::from(vec![
            Span::styled(
                format!("Delete {title}? "),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ),
            Span::styled("y", Style::default().fg(theme.accent)),
            Span::raw(" to confirm, any other key to keep it"),
        ])
    } else if let Some(err) = trips.error.as_deref() {
        Line::from(Span::styled(err.to_string(), Style::default().fg(theme.error)))
    } else {
        Line::from(vec![
            Span::styled("Trips", Style::default().fg(theme.dim)),
            Span::raw(format!(": {}", trips.items.len())),
        ])
    };
    Card::new("Dashboard", theme).render_with(frame, area, Paragraph::new(line));
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let trips = &state.trips;
    if trips.items.is_empty() {
        let message = if trips.loaded {
            "No trips yet. Press n to plan one."
        } else {
            "Loading trips…"
        };
        render_empty(frame, area, "My trips", message, theme);
        return;
    }

    let open_id = state.trip.flow.as_ref().map(|flow| flow.trip().id.as_str());
    let items = trips
        .items
        .iter()
        .map(|trip| trip_item(trip, open_id == Some(trip.id.as_str()), theme))
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(trips.selected));

    let card = Card::new("My trips", theme);
    let list = List::new(items)
        .block(card.block())
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn trip_item(trip: &TripSummary, open: bool, theme: &Theme) -> ListItem<'static> {
    let title = trip.title.clone().unwrap_or_else(|| "Untitled".to_string());
    let destination = match (&trip.destination_city, &trip.destination_country) {
        (Some(city), Some(country)) => format!("{city}, {country}"),
        (None, Some(country)) => country.clone(),
        (Some(city), None) => city.clone(),
        (None, None) => "-".to_string(),
    };
    let dates = match (trip.start_date, trip.end_date) {
        (Some(start), Some(end)) => format!("{start} → {end}"),
        (Some(start), None) => format!("from {start}"),
        _ => "no dates".to_string(),
    };

    let mut spans = vec![
        Span::styled(format!("{title:<28}"), Style::default().fg(theme.text)),
        Span::styled(format!("{destination:<24}"), Style::default().fg(theme.text_muted)),
        Span::styled(format!("{dates:<26}"), Style::default().fg(theme.dim)),
    ];
    if let Some(status) = &trip.status {
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(theme.accent),
        ));
    }
    if let Some(version) = trip.current_version {
        spans.push(Span::styled(
            format!("  v{version}"),
            Style::default().fg(theme.dim),
        ));
    }
    if open {
        spans.push(Span::styled("  (open)", Style::default().fg(theme.positive)));
    }
    ListItem::new(Line::from(spans))
}
