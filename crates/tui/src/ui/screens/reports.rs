use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use api_types::report::{DestinationReport, ItineraryReport, VisaReport};
use planner::ReportOutcome;

use crate::{
    app::{AppState, ReportTab},
    ui::{components::card::Card, local_time, report_tab_label, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let reports = &state.reports;
    let mut tabs = Vec::new();
    for (i, tab) in ReportTab::ALL.iter().enumerate() {
        if i > 0 {
            tabs.push(Span::raw("  "));
        }
        tabs.push(report_tab_label(*tab, reports.tab, &theme));
    }
    Card::new("Reports", &theme).render_with(frame, layout[0], Paragraph::new(Line::from(tabs)));

    let tz = state.timezone;
    let lines = match reports.tab {
        ReportTab::Visa => outcome_lines(reports.visa.as_ref(), &theme, |r| visa_lines(r, tz, &theme)),
        ReportTab::Destination => outcome_lines(reports.destination.as_ref(), &theme, |r| {
            destination_lines(r, tz, &theme)
        }),
        ReportTab::Itinerary => outcome_lines(reports.itinerary.as_ref(), &theme, |r| {
            itinerary_lines(r, tz, &theme)
        }),
    };
    Card::new(reports.tab.label(), &theme).render_with(
        frame,
        layout[1],
        Paragraph::new(lines).wrap(Wrap { trim: false }),
    );
}

fn outcome_lines<T>(
    outcome: Option<&ReportOutcome<T>>,
    theme: &Theme,
    body: impl Fn(&T) -> Vec<Line<'static>>,
) -> Vec<Line<'static>> {
    let dim = |text: &str| Line::from(Span::styled(text.to_string(), Style::default().fg(theme.dim)));
    match outcome {
        None => vec![dim("Loading…")],
        Some(ReportOutcome::Ready(report)) => body(report),
        Some(ReportOutcome::Sample { data, reason }) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    "Sample data: the real report could not be loaded",
                    Style::default()
                        .fg(theme.warning)
                        .add_modifier(Modifier::BOLD),
                )),
                dim(reason.as_str()),
                Line::raw(""),
            ];
            lines.extend(body(data));
            lines
        }
        Some(ReportOutcome::NotFound) => vec![
            dim("This report has not been generated yet."),
            dim("Save the trip with recalculation, or start one with r on the Trip tab."),
        ],
        Some(ReportOutcome::Unauthorized) => vec![Line::from(Span::styled(
            "Not allowed to read this report. Sign in again.",
            Style::default().fg(theme.error),
        ))],
        Some(ReportOutcome::TransientError(err)) => vec![
            Line::from(Span::styled(err.clone(), Style::default().fg(theme.error))),
            dim("Press r to try again."),
        ],
    }
}

fn field(label: &str, value: impl Into<String>, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<18}"), Style::default().fg(theme.dim)),
        Span::styled(value.into(), Style::default().fg(theme.text)),
    ])
}

fn bullets(title: &str, items: &[String], theme: &Theme) -> Vec<Line<'static>> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(theme.accent),
        )),
    ];
    lines.extend(items.iter().map(|item| Line::raw(format!("  • {item}"))));
    lines
}

fn generated(at: Option<DateTime<Utc>>, tz: Tz, theme: &Theme) -> Option<Line<'static>> {
    at.map(|at| {
        Line::from(Span::styled(
            format!("Generated {}", local_time(at, tz)),
            Style::default().fg(theme.dim),
        ))
    })
}

fn visa_lines(report: &VisaReport, tz: Tz, theme: &Theme) -> Vec<Line<'static>> {
    let required = if report.visa_required {
        Span::styled("Visa required", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("No visa required", Style::default().fg(theme.positive).add_modifier(Modifier::BOLD))
    };
    let mut lines = vec![Line::from(required), Line::raw("")];
    lines.push(field("Destination", report.destination_country.clone(), theme));
    if let Some(nationality) = &report.nationality {
        lines.push(field("Passport", nationality.clone(), theme));
    }
    if let Some(kind) = &report.visa_type {
        lines.push(field("Visa type", kind.clone(), theme));
    }
    if let Some(days) = report.max_stay_days {
        lines.push(field("Max stay", format!("{days} days"), theme));
    }
    if let Some(time) = &report.processing_time {
        lines.push(field("Processing", time.clone(), theme));
    }
    lines.extend(bullets("Documents", &report.required_documents, theme));
    lines.extend(bullets("Notes", &report.notes, theme));
    lines.extend(generated(report.generated_at, tz, theme));
    lines
}

fn destination_lines(report: &DestinationReport, tz: Tz, theme: &Theme) -> Vec<Line<'static>> {
    let place = match &report.city {
        Some(city) => format!("{city}, {}", report.country),
        None => report.country.clone(),
    };
    let mut lines = vec![
        Line::from(Span::styled(place, Style::default().fg(theme.text).add_modifier(Modifier::BOLD))),
        Line::raw(report.overview.clone()),
        Line::raw(""),
    ];
    if let Some(best) = &report.best_time_to_visit {
        lines.push(field("Best time", best.clone(), theme));
    }
    if let Some(currency) = &report.currency {
        lines.push(field("Currency", currency.clone(), theme));
    }
    if !report.languages.is_empty() {
        lines.push(field("Languages", report.languages.join(", "), theme));
    }
    if let Some(safety) = &report.safety_level {
        lines.push(field("Safety", safety.clone(), theme));
    }
    if let Some(weather) = &report.weather_summary {
        lines.push(field("Weather", weather.clone(), theme));
    }
    lines.extend(bullets("Highlights", &report.highlights, theme));
    lines.extend(generated(report.generated_at, tz, theme));
    lines
}

fn itinerary_lines(report: &ItineraryReport, tz: Tz, theme: &Theme) -> Vec<Line<'static>> {
    let currency = report.currency.clone().unwrap_or_default();
    let mut lines = Vec::new();
    for day in &report.days {
        let date = day.date.map(|d| format!("  {d}")).unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(
                format!("Day {}: {}", day.day, day.title),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(date, Style::default().fg(theme.dim)),
        ]));
        for activity in &day.activities {
            let mut spans = vec![
                Span::styled(
                    format!("  {:<7}", activity.time.as_deref().unwrap_or("")),
                    Style::default().fg(theme.dim),
                ),
                Span::raw(activity.title.clone()),
            ];
            if let Some(location) = &activity.location {
                spans.push(Span::styled(
                    format!(" @ {location}"),
                    Style::default().fg(theme.text_muted),
                ));
            }
            if let Some(cost) = activity.estimated_cost {
                spans.push(Span::styled(
                    format!("  ~{cost:.0} {currency}"),
                    Style::default().fg(theme.dim),
                ));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "The itinerary has no days yet.",
            Style::default().fg(theme.dim),
        )));
    }
    if let Some(total) = report.total_estimated_cost {
        lines.push(field("Estimated total", format!("{total:.2} {currency}"), theme));
    }
    lines.extend(generated(report.generated_at, tz, theme));
    lines
}
