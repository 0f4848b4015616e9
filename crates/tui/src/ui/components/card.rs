use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Rounded panel with a title, the container for every content block.
///
/// An optional badge is drawn on the right of the top border; trip cards use
/// it for the version number, the recalculation panel for its live state.
pub struct Card<'a> {
    title: &'a str,
    theme: &'a Theme,
    focused: bool,
    badge: Option<(String, Color)>,
}

impl<'a> Card<'a> {
    pub fn new(title: &'a str, theme: &'a Theme) -> Self {
        Self {
            title,
            theme,
            focused: false,
            badge: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn badge(mut self, text: impl Into<String>, color: Color) -> Self {
        self.badge = Some((text.into(), color));
        self
    }

    pub fn block(&self) -> Block<'a> {
        let border = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title_top(Line::from(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(self.theme.accent),
            )));
        if let Some((text, color)) = &self.badge {
            block = block.title_top(
                Line::from(Span::styled(
                    format!(" {text} "),
                    Style::default().fg(*color).add_modifier(Modifier::BOLD),
                ))
                .right_aligned(),
            );
        }
        block
    }

    pub fn render_with<W: Widget>(&self, frame: &mut Frame<'_>, area: Rect, content: W) {
        let block = self.block();
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(content, inner);
    }
}

/// Figure tile for the analytics row.
pub struct StatCard<'a> {
    title: &'a str,
    value: String,
    caption: Option<String>,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(title: &'a str, value: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title,
            value: value.into(),
            caption: None,
            theme,
        }
    }

    pub fn subtitle(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let value = Span::styled(
            self.value.clone(),
            Style::default()
                .fg(self.theme.text)
                .add_modifier(Modifier::BOLD),
        );
        let lines = std::iter::once(Line::from(value))
            .chain(
                self.caption
                    .iter()
                    .map(|c| Line::from(Span::styled(c.clone(), Style::default().fg(self.theme.dim)))),
            )
            .collect::<Vec<_>>();
        Card::new(self.title, self.theme).render_with(frame, area, Paragraph::new(lines));
    }
}
