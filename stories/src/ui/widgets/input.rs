//! Single-line text input widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::StoryTheme;

/// Text input with a visible cursor
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a StoryTheme,
    title: Option<&'a str>,
    placeholder: &'a str,
    is_active: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a StoryTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            title: None,
            placeholder: "",
            is_active: true,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));
        if let Some(title) = self.title {
            block = block.title(format!(" {title} "));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() {
            let mut spans = vec![Span::styled("> ", self.theme.reply_style())];
            if self.is_active {
                spans.push(Span::styled(
                    " ",
                    Style::default().add_modifier(Modifier::UNDERLINED),
                ));
            }
            spans.push(Span::styled(
                self.placeholder,
                Style::default().add_modifier(Modifier::DIM),
            ));
            Line::from(spans)
        } else if !self.is_active {
            Line::from(vec![
                Span::styled("> ", self.theme.reply_style()),
                Span::raw(self.content),
            ])
        } else {
            // Character-based slicing keeps multi-byte input intact
            let before_cursor: String = self.content.chars().take(self.cursor_position).collect();
            let at_cursor = self
                .content
                .chars()
                .nth(self.cursor_position)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after_cursor: String = self.content.chars().skip(self.cursor_position + 1).collect();

            Line::from(vec![
                Span::styled("> ", self.theme.reply_style()),
                Span::raw(before_cursor),
                Span::styled(
                    at_cursor,
                    Style::default()
                        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                        .fg(self.theme.reply_text),
                ),
                Span::raw(after_cursor),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}
