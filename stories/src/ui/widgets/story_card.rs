//! The body of the story viewer.

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use stories_core::{Story, StoryBody};

use crate::ui::theme::StoryTheme;

pub struct StoryCardWidget<'a> {
    story: &'a Story,
    now: DateTime<Utc>,
    paused: bool,
    theme: &'a StoryTheme,
}

impl<'a> StoryCardWidget<'a> {
    pub fn new(story: &'a Story, now: DateTime<Utc>, theme: &'a StoryTheme) -> Self {
        Self {
            story,
            now,
            paused: false,
            theme,
        }
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    fn header(&self) -> Line<'a> {
        let author = self.story.author();
        let mut spans = vec![Span::styled(author.name.clone(), self.theme.title_style())];
        if author.verified {
            spans.push(Span::styled(" ✓", self.theme.verified_style()));
        }
        spans.push(Span::styled(
            format!("  {}", self.story.format_remaining(self.now)),
            self.theme.system_style(),
        ));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            self.story.privacy_tier().label(),
            self.theme.privacy_style(self.story.privacy_tier()),
        ));
        if self.paused {
            spans.push(Span::styled(
                "  ❚❚ paused",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    }

    fn reactions(&self) -> Line<'a> {
        if self.story.reactions().is_empty() {
            return Line::from(Span::styled("No reactions yet", self.theme.system_style()));
        }
        let spans: Vec<Span> = self
            .story
            .reactions()
            .iter()
            .map(|(symbol, count)| Span::raw(format!("{symbol} {count}  ")))
            .collect();
        Line::from(spans)
    }
}

impl Widget for StoryCardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Author line
                Constraint::Min(3),    // Content
                Constraint::Length(1), // Reactions
            ])
            .split(area);

        Paragraph::new(self.header()).render(chunks[0], buf);

        match self.story.body() {
            StoryBody::Text {
                content,
                background,
            } => {
                let fill = self.theme.background_color(*background);
                let inner = chunks[1];
                // Vertically center the text within the colored block.
                let lines = content.lines().count().max(1) as u16;
                let pad = inner.height.saturating_sub(lines) / 2;
                let mut text: Vec<Line> = (0..pad).map(|_| Line::from("")).collect();
                text.extend(content.lines().map(|l| {
                    Line::from(Span::styled(
                        l.to_string(),
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ))
                }));
                Paragraph::new(text)
                    .style(Style::default().bg(fill))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
            }
            StoryBody::Photo { media, caption } | StoryBody::Video { media, caption } => {
                let kind = self.story.kind();
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style(false))
                    .title(format!(" {} {} ", self.theme.kind_icon(kind), kind));
                let inner = block.inner(chunks[1]);
                block.render(chunks[1], buf);

                let mut text = vec![
                    Line::from(""),
                    Line::from(Span::styled(media.clone(), Style::default().fg(Color::Gray))),
                ];
                if let Some(caption) = caption {
                    text.push(Line::from(""));
                    text.push(Line::from(Span::styled(
                        caption.clone(),
                        self.theme.caption_style(),
                    )));
                }
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
            }
        }

        Paragraph::new(self.reactions()).render(chunks[2], buf);
    }
}
