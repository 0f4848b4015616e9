use ratatui::style::Color;

use planner::ImpactLevel;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub panel: Color,
    pub text: Color,
    pub text_muted: Color,
    pub dim: Color,
    pub accent: Color,
    pub positive: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(8, 12, 16),
            panel: Color::Rgb(20, 26, 32),
            text: Color::Rgb(220, 220, 220),
            text_muted: Color::Rgb(160, 160, 160),
            dim: Color::Rgb(120, 120, 120),
            accent: Color::Rgb(80, 160, 160),
            positive: Color::Rgb(110, 180, 110),
            warning: Color::Rgb(210, 170, 80),
            error: Color::Rgb(200, 80, 80),
            border: Color::Rgb(60, 70, 80),
            border_focused: Color::Rgb(80, 160, 160),
        }
    }
}

impl Theme {
    /// Color of an impact badge; fields without a known impact are dim.
    pub fn impact(&self, level: Option<ImpactLevel>) -> Color {
        match level {
            Some(ImpactLevel::High) => self.error,
            Some(ImpactLevel::Medium) => self.warning,
            Some(ImpactLevel::Low) => self.positive,
            None => self.dim,
        }
    }
}
