use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use api_types::version::TripVersion;
use planner::{TripPage, compare_versions, field_label};

use crate::{
    app::AppState,
    ui::{
        components::{card::Card, dialog::change_line},
        local_time,
        screens::render_empty,
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let Some(page) = state.trip.page.as_ref() else {
        render_empty(frame, area, "Versions", "Open a trip first.", &theme);
        return;
    };
    if page.history.versions.is_empty() {
        let message = page
            .history_error
            .as_deref()
            .map_or("No versions recorded yet.".to_string(), |err| {
                format!("History unavailable: {err}")
            });
        render_empty(frame, area, "Versions", &message, &theme);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if state.versions.confirm_restore.is_some() { 3 } else { 0 }),
            Constraint::Min(0),
        ])
        .split(area);
    if let Some(version) = state.versions.confirm_restore {
        let line = Line::from(vec![
            Span::styled(
                format!("Restore version {version}? "),
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
            ),
            Span::raw("This saves it as a new version. "),
            Span::styled("y", Style::default().fg(theme.accent)),
            Span::raw(" to confirm"),
        ]);
        Card::new("Restore", &theme)
            .focused(true)
            .render_with(frame, rows[0], Paragraph::new(line));
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    render_list(frame, columns[0], state, page, &theme);
    match state.versions.comparison() {
        Some((from, to)) => render_comparison(frame, columns[1], page, from, to, &theme),
        None => render_selected(frame, columns[1], state, page, &theme),
    }
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &AppState, page: &TripPage, theme: &Theme) {
    let current = page.current_version();
    let items = page
        .history
        .versions
        .iter()
        .map(|version| {
            let marked = state.versions.marked.contains(&version.version);
            let mut spans = vec![
                Span::styled(
                    if marked { "● " } else { "  " },
                    Style::default().fg(theme.accent),
                ),
                Span::styled(
                    format!("v{:<4}", version.version),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    local_time(version.created_at, state.timezone),
                    Style::default().fg(theme.dim),
                ),
            ];
            if Some(version.version) == current {
                spans.push(Span::styled("  current", Style::default().fg(theme.positive)));
            }
            if let Some(summary) = &version.change_summary {
                spans.push(Span::styled(
                    format!("  {summary}"),
                    Style::default().fg(theme.text_muted),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(state.versions.selected));
    let title = if page.history.total > page.history.versions.len() as u32 {
        format!(
            "History ({} of {})",
            page.history.versions.len(),
            page.history.total
        )
    } else {
        "History".to_string()
    };
    let list = List::new(items)
        .block(Card::new(&title, theme).block())
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_selected(frame: &mut Frame<'_>, area: Rect, state: &AppState, page: &TripPage, theme: &Theme) {
    let Some(version) = page.history.versions.get(state.versions.selected) else {
        render_empty(frame, area, "Version", "Select a version.", theme);
        return;
    };
    let lines = version_lines(version, theme);
    Card::new(&format!("Version {}", version.version), theme).render_with(
        frame,
        area,
        Paragraph::new(lines).wrap(Wrap { trim: true }),
    );
}

fn version_lines(version: &TripVersion, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(summary) = &version.change_summary {
        lines.push(Line::from(Span::styled(
            summary.clone(),
            Style::default().fg(theme.text),
        )));
    }
    if let Some(author) = &version.created_by {
        lines.push(Line::from(Span::styled(
            format!("by {author}"),
            Style::default().fg(theme.dim),
        )));
    }
    if !version.changed_fields.is_empty() {
        let fields = version
            .changed_fields
            .iter()
            .map(|field| field_label(field))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled("Changed: ", Style::default().fg(theme.dim)),
            Span::raw(fields),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Destination ", Style::default().fg(theme.dim)),
        Span::raw(version.snapshot.destination_label()),
    ]));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Mark two versions with space to compare them.",
        Style::default().fg(theme.dim),
    )));
    lines
}

fn render_comparison(
    frame: &mut Frame<'_>,
    area: Rect,
    page: &TripPage,
    from: u32,
    to: u32,
    theme: &Theme,
) {
    let title = format!("v{from} → v{to}");
    let lines = match compare_versions(&page.history, from, to) {
        Ok(Some(comparison)) if comparison.changes.is_empty() => vec![Line::from(Span::styled(
            "No differences in trip fields.",
            Style::default().fg(theme.dim),
        ))],
        Ok(Some(comparison)) => comparison
            .changes
            .iter()
            .map(|change| change_line(change, theme))
            .collect(),
        Ok(None) => vec![Line::from(Span::styled(
            "One of these versions is not loaded.",
            Style::default().fg(theme.dim),
        ))],
        Err(err) => vec![Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        ))],
    };

    Card::new(&title, theme).focused(true).render_with(
        frame,
        area,
        Paragraph::new(lines).wrap(Wrap { trim: true }),
    );
}
