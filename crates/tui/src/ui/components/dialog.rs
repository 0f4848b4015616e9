use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};

use planner::{ChangePreview, EditFlow, EditPhase, FieldChange};

use crate::ui::{
    components::{card::Card, centered_box},
    format_value,
    theme::Theme,
};

/// Change preview and confirmation for a pending trip edit.
pub fn render(frame: &mut Frame<'_>, area: Rect, flow: &EditFlow, theme: &Theme) {
    let Some(preview) = flow.preview() else {
        return;
    };

    let mut lines = Vec::new();
    for change in &preview.changes {
        lines.push(change_line(change, theme));
    }
    lines.push(Line::raw(""));
    lines.extend(impact_lines(preview, theme));

    if preview.impact.requires_recalculation {
        let mark = if flow.recalculate() { "[x]" } else { "[ ]" };
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(mark, Style::default().fg(theme.accent)),
            Span::raw(" Recalculate affected reports  "),
            Span::styled("space", Style::default().fg(theme.accent)),
            Span::styled(" toggle", Style::default().fg(theme.dim)),
        ]));
    }

    if let Some(err) = flow.error() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(theme.error),
        )));
    }

    lines.push(Line::raw(""));
    lines.push(match flow.phase() {
        EditPhase::Applying => Line::from(Span::styled(
            "Saving…",
            Style::default().fg(theme.text_muted),
        )),
        _ => Line::from(vec![
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(" save  "),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" back to editing"),
        ]),
    });

    let height = (lines.len() as u16).saturating_add(2);
    let rect = centered_box(area.width.saturating_sub(8).min(84), height, area);
    let title = match flow.phase() {
        EditPhase::Confirming | EditPhase::Applying => "Confirm changes",
        _ => "Review changes",
    };

    frame.render_widget(Clear, rect);
    Card::new(title, theme).focused(true).render_with(
        frame,
        rect,
        Paragraph::new(lines).wrap(Wrap { trim: false }),
    );
}

pub fn change_line(change: &FieldChange, theme: &Theme) -> Line<'static> {
    let level = change.impact_level();
    let badge = level.map_or("unknown", |level| level.label());
    Line::from(vec![
        Span::styled(
            format!("{:<18}", change.label),
            Style::default().fg(theme.text),
        ),
        Span::styled(
            format_value(&change.old_value),
            Style::default().fg(theme.dim),
        ),
        Span::raw(" → "),
        Span::styled(
            format_value(&change.new_value),
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{badge}]"),
            Style::default().fg(theme.impact(level)),
        ),
    ])
}

fn impact_lines(preview: &ChangePreview, theme: &Theme) -> Vec<Line<'static>> {
    let impact = &preview.impact;
    let mut lines = vec![Line::from(Span::styled(
        impact.message(),
        Style::default()
            .fg(theme.impact(impact.highest_impact))
            .add_modifier(Modifier::BOLD),
    ))];

    if !impact.affected_sections.is_empty() {
        let sections = impact
            .affected_sections
            .iter()
            .map(|section| section.label())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled("Sections: ", Style::default().fg(theme.dim)),
            Span::raw(sections),
        ]));
        lines.push(Line::from(Span::styled(
            format!("About {}s to regenerate", impact.estimated_recalc_seconds),
            Style::default().fg(theme.dim),
        )));
    }
    if !impact.unknown_impact_fields.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(
                "No report impact known for: {}",
                impact.unknown_impact_fields.join(", ")
            ),
            Style::default().fg(theme.dim),
        )));
    }
    lines
}
