use chrono_tz::Tz;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use api_types::recalculation::RecalculationStatus;
use planner::RecalcTracker;

use crate::ui::{
    components::{card::Card, charts::percentage_bar},
    local_time,
    theme::Theme,
};

pub const HEIGHT: u16 = 7;

/// Recalculation status panel for the open trip.
pub fn render(frame: &mut Frame<'_>, area: Rect, tracker: &RecalcTracker, tz: Tz, theme: &Theme) {
    let progress = tracker.progress();
    let status_color = match progress.status {
        RecalculationStatus::Completed => theme.positive,
        RecalculationStatus::Failed | RecalculationStatus::TimedOut => theme.error,
        RecalculationStatus::Cancelled | RecalculationStatus::Idle => theme.dim,
        RecalculationStatus::Queued | RecalculationStatus::Processing => theme.accent,
    };

    let mut status = vec![
        Span::styled(
            progress.status.label(),
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            percentage_bar(progress.progress, 24),
            Style::default().fg(status_color),
        ),
    ];
    if let Some(agent) = &progress.current_agent {
        status.push(Span::styled(
            format!("  running {agent}"),
            Style::default().fg(theme.text_muted),
        ));
    }

    let mut lines = vec![Line::from(status)];
    if !progress.completed_agents.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Done: ", Style::default().fg(theme.dim)),
            Span::styled(
                progress.completed_agents.join(", "),
                Style::default().fg(theme.positive),
            ),
        ]));
    }
    if !progress.failed_agents.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Failed: ", Style::default().fg(theme.dim)),
            Span::styled(
                progress.failed_agents.join(", "),
                Style::default().fg(theme.error),
            ),
        ]));
    }
    if let Some(started) = progress.started_at {
        lines.push(Line::from(Span::styled(
            format!(
                "Started {}  polls {}",
                local_time(started, tz),
                tracker.attempts()
            ),
            Style::default().fg(theme.dim),
        )));
    }
    if let Some(err) = progress.error.as_deref().or(tracker.last_error()) {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    Card::new("Recalculation", theme)
        .focused(tracker.is_polling())
        .badge(format!("{}%", progress.progress), status_color)
        .render_with(frame, area, Paragraph::new(lines));
}
