use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A key and what it does, as shown in the bottom bar.
#[derive(Debug, Clone, Copy)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

pub const FORM_EDITING: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("Enter", "save"),
    KeyHint::new("Esc", "cancel"),
];

pub const CONFIRM: &[KeyHint] = &[KeyHint::new("y", "confirm"), KeyHint::new("any", "cancel")];
