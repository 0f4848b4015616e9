use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    forms::{WizardState, WizardStep},
    ui::{components::card::Card, screens::form_line, theme::Theme},
};

const STEPS: [WizardStep; 5] = [
    WizardStep::Template,
    WizardStep::Destination,
    WizardStep::Dates,
    WizardStep::Budget,
    WizardStep::Confirm,
];

pub fn render(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_steps(frame, layout[0], wizard.step, theme);
    match wizard.step {
        WizardStep::Template => render_templates(frame, layout[1], wizard, theme),
        WizardStep::Confirm => render_summary(frame, layout[1], wizard, theme),
        step => {
            let lines = step
                .fields()
                .iter()
                .map(|field| {
                    form_line(
                        field.label(),
                        wizard.value(*field),
                        wizard.focused() == Some(*field),
                        theme,
                    )
                })
                .collect::<Vec<_>>();
            Card::new(step.label(), theme)
                .focused(true)
                .render_with(frame, layout[1], Paragraph::new(lines));
        }
    }

    let footer = match wizard.error.as_deref() {
        Some(err) => Line::from(Span::styled(err.to_string(), Style::default().fg(theme.error))),
        None => Line::from(Span::styled(
            "Dates use YYYY-MM-DD. Leave a field empty to skip it.",
            Style::default().fg(theme.dim),
        )),
    };
    Card::new("", theme).render_with(frame, layout[2], Paragraph::new(footer));
}

fn render_steps(frame: &mut Frame<'_>, area: Rect, active: WizardStep, theme: &Theme) {
    let mut spans = Vec::new();
    for (i, step) in STEPS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(theme.dim)));
        }
        let style = if *step == active {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_muted)
        };
        spans.push(Span::styled(format!("{}. {}", i + 1, step.label()), style));
    }
    Card::new("New trip", theme).render_with(frame, area, Paragraph::new(Line::from(spans)));
}

fn render_templates(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let mut items = vec![ListItem::new(Line::from(vec![
        Span::styled("Blank trip", Style::default().fg(theme.text)),
        Span::styled("  start from scratch", Style::default().fg(theme.dim)),
    ]))];
    items.extend(wizard.templates.iter().map(|template| {
        let mut spans = vec![Span::styled(
            template.name.clone(),
            Style::default().fg(theme.text),
        )];
        let destination = [
            template.destination_city.as_deref(),
            template.destination_country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
        if !destination.is_empty() {
            spans.push(Span::styled(
                format!("  {destination}"),
                Style::default().fg(theme.text_muted),
            ));
        }
        if let Some(days) = template.duration_days {
            spans.push(Span::styled(
                format!("  {days} days"),
                Style::default().fg(theme.dim),
            ));
        }
        if let Some(style) = &template.travel_style {
            spans.push(Span::styled(
                format!("  {style}"),
                Style::default().fg(theme.accent),
            ));
        }
        ListItem::new(Line::from(spans))
    }));

    let mut list_state = ListState::default();
    list_state.select(Some(wizard.cursor));
    let list = List::new(items)
        .block(Card::new("Start from a template", theme).focused(true).block())
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_summary(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let lines = match wizard.to_create() {
        Ok(create) => {
            let row = |label: &str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{label:<14}"), Style::default().fg(theme.dim)),
                    Span::styled(value, Style::default().fg(theme.text)),
                ])
            };
            let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
            vec![
                row("Title", create.title),
                row("Country", create.destination_country),
                row("City", optional(create.destination_city)),
                row("Start", optional(create.start_date.map(|d| d.to_string()))),
                row("End", optional(create.end_date.map(|d| d.to_string()))),
                row(
                    "Budget",
                    match (create.budget, create.currency) {
                        (Some(budget), Some(currency)) => format!("{budget:.2} {currency}"),
                        (Some(budget), None) => format!("{budget:.2}"),
                        _ => "-".to_string(),
                    },
                ),
                row("Travelers", optional(create.travelers.map(|t| t.to_string()))),
                row(
                    "Template",
                    optional(wizard.selected_template().map(|t| t.name.clone())),
                ),
                Line::raw(""),
                Line::from(vec![
                    Span::styled("Enter", Style::default().fg(theme.accent)),
                    Span::raw(" create trip"),
                ]),
            ]
        }
        Err(err) => vec![Line::from(Span::styled(err, Style::default().fg(theme.error)))],
    };
    Card::new("Confirm", theme)
        .focused(true)
        .render_with(frame, area, Paragraph::new(lines));
}
