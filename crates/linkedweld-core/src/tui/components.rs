//! Reusable TUI components

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A metric card widget showing a single value with a label
pub struct MetricCard<'a> {
    title: &'a str,
    value: String,
    color: Color,
    caption: Option<String>,
}

impl<'a> MetricCard<'a> {
    /// Card with a white value
    pub fn new(title: &'a str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
            color: Color::White,
            caption: None,
        }
    }

    /// Value colour
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Muted text shown after the value, e.g. "of 12"
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Draw the card into `area`
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let mut spans = vec![Span::styled(self.value, Style::default().fg(self.color).bold())];
        if let Some(caption) = self.caption {
            spans.push(Span::styled(
                format!(" {caption}"),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans))
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}

/// Inline progress bar drawn with block characters
pub struct ProgressBar {
    value: f64,
    max: f64,
}

impl ProgressBar {
    /// Bar for `value` out of `max`
    pub fn new(value: f64, max: f64) -> Self {
        Self { value, max }
    }

    /// Render `width` cells, filled in proportion and clamped to full
    pub fn render_inline(&self, width: usize) -> String {
        let pct = if self.max > 0.0 {
            (self.value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (pct * width as f64).round() as usize;
        let empty = width - filled.min(width);

        format!("{}{}", "█".repeat(filled.min(width)), "░".repeat(empty))
    }
}

/// Status indicator (colored dot with label)
pub struct StatusIndicator<'a> {
    label: &'a str,
    status: Status,
}

/// State shown by a [`StatusIndicator`]
pub enum Status {
    /// Healthy
    Ok,
    /// Needs attention
    Warning,
    /// Failing
    Error,
    /// Not known yet
    Unknown,
}

impl<'a> StatusIndicator<'a> {
    /// Indicator for `label`
    pub fn new(label: &'a str, status: Status) -> Self {
        Self { label, status }
    }

    /// Dot and label as one styled span
    pub fn to_span(&self) -> Span<'a> {
        let (symbol, color) = match self.status {
            Status::Ok => ("●", Color::Green),
            Status::Warning => ("●", Color::Yellow),
            Status::Error => ("●", Color::Red),
            Status::Unknown => ("○", Color::DarkGray),
        };

        Span::styled(
            format!("{} {}", symbol, self.label),
            Style::default().fg(color),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(ProgressBar::new(5.0, 10.0).render_inline(4), "██░░");
        assert_eq!(ProgressBar::new(15.0, 10.0).render_inline(4), "████");
        assert_eq!(ProgressBar::new(1.0, 0.0).render_inline(3), "░░░");
    }
}
